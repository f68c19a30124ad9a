//! SVG logo support.
//!
//! Only the subset of SVG that company logos typically use is
//! understood: the root `width`/`height`/`viewBox`, and `<path>` elements
//! with a solid `fill` and optional `fill-rule`.  Path data may use the
//! `M L H V C S Q T Z` commands in absolute or relative form.  Grouping
//! with `<g>` is allowed as long as no element carries a `transform`.
//! Anything else, including other shape elements, text and images, is
//! reported as a [`LogoError`] so the layout engine can skip the logo
//! instead of failing the page or drawing only part of it.

use crate::layout::Rgb;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

/// Written to disk when no logo file exists yet.
pub const DEFAULT_LOGO_SVG: &str = r##"<svg width="36" height="40" viewBox="0 0 36 40" fill="none" xmlns="http://www.w3.org/2000/svg">
<path fill-rule="evenodd" clip-rule="evenodd" d="M0 15V31H5C5.52527 31 6.04541 31.1035 6.53076 31.3045C7.01599 31.5055 7.45703 31.8001 7.82837 32.1716C8.19983 32.543 8.49451 32.984 8.69556 33.4693C8.89648 33.9546 9 34.4747 9 35V40H21L36 25V9H31C30.4747 9 29.9546 8.89655 29.4692 8.69553C28.984 8.49451 28.543 8.19986 28.1716 7.82843C27.8002 7.457 27.5055 7.01602 27.3044 6.53073C27.1035 6.04544 27 5.5253 27 5V0H15L0 15ZM17 30H10V19L19 10H26V21L17 30Z" fill="#0004E8"></path>
</svg>
"##;

static SVG_ROOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<svg\b([^>]*)>").expect("valid regex"));
static PATH_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<path\b([^>]*?)/?>").expect("valid regex"));
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid regex")
});
static UNSUPPORTED_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(circle|rect|ellipse|line|polyline|polygon|text|image|use|foreignObject)\b")
        .expect("valid regex")
});
static TRANSFORMED_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<([A-Za-z][-A-Za-z0-9:]*)\b[^>]*?\stransform\s*=").expect("valid regex")
});
static STYLE_FILL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|;)\s*fill\s*:\s*([^;]+)").expect("valid regex"));

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LogoError {
    #[error("no <svg> root element found")]
    MissingRoot,
    #[error("logo has no usable width/height or viewBox")]
    MissingDimensions,
    #[error("unsupported path command '{0}'")]
    UnsupportedCommand(char),
    #[error("malformed path data near {0:?}")]
    MalformedPath(String),
    #[error("unsupported element <{0}>")]
    UnsupportedElement(String),
    #[error("transform on <{0}> is not supported")]
    UnsupportedTransform(String),
    #[error("unsupported fill colour {0:?}")]
    UnsupportedColor(String),
    #[error("logo contains no drawable paths")]
    Empty,
}

/// A point in user space.  Logo coordinates grow downwards, page
/// coordinates grow upwards; [`Logo::place`] performs the flip.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
}

impl PathCmd {
    fn map(self, f: impl Fn(Point) -> Point) -> Self {
        match self {
            PathCmd::MoveTo(p) => PathCmd::MoveTo(f(p)),
            PathCmd::LineTo(p) => PathCmd::LineTo(f(p)),
            PathCmd::CubicTo(a, b, p) => PathCmd::CubicTo(f(a), f(b), f(p)),
        }
    }
}

/// One filled `<path>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoShape {
    pub fill: Rgb,
    pub even_odd: bool,
    pub subpaths: Vec<Vec<PathCmd>>,
}

/// A parsed logo, in its intrinsic size.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    pub width: f32,
    pub height: f32,
    pub shapes: Vec<LogoShape>,
}

impl Logo {
    pub fn parse(svg: &str) -> Result<Self, LogoError> {
        let root = SVG_ROOT.captures(svg).ok_or(LogoError::MissingRoot)?;
        let attrs = attributes(root.get(1).map_or("", |m| m.as_str()));

        let view_box = attrs.get("viewBox").and_then(|v| parse_view_box(v));
        let declared_w = attrs.get("width").and_then(|v| parse_length(v));
        let declared_h = attrs.get("height").and_then(|v| parse_length(v));

        let (width, height, transform) = match (view_box, declared_w, declared_h) {
            (Some([min_x, min_y, vb_w, vb_h]), w, h) => {
                let width = w.unwrap_or(vb_w);
                let height = h.unwrap_or(vb_h);
                let (sx, sy) = (width / vb_w, height / vb_h);
                (width, height, [min_x, min_y, sx, sy])
            }
            (None, Some(w), Some(h)) => (w, h, [0.0, 0.0, 1.0, 1.0]),
            _ => return Err(LogoError::MissingDimensions),
        };
        if !(width > 0.0 && height > 0.0) {
            return Err(LogoError::MissingDimensions);
        }
        let [min_x, min_y, sx, sy] = transform;
        let to_logo = |p: Point| Point::new((p.x - min_x) * sx, (p.y - min_y) * sy);

        if let Some(caps) = UNSUPPORTED_ELEMENT.captures(svg) {
            return Err(LogoError::UnsupportedElement(caps[1].to_string()));
        }
        if let Some(caps) = TRANSFORMED_ELEMENT.captures(svg) {
            return Err(LogoError::UnsupportedTransform(caps[1].to_string()));
        }

        let mut shapes = Vec::new();
        for element in PATH_ELEMENT.captures_iter(svg) {
            let attrs = attributes(element.get(1).map_or("", |m| m.as_str()));
            let Some(fill) = fill_of(&attrs)? else {
                continue;
            };
            let data = attrs.get("d").map(String::as_str).unwrap_or("");
            let subpaths: Vec<Vec<PathCmd>> = parse_path_data(data)?
                .into_iter()
                .map(|subpath| subpath.into_iter().map(|cmd| cmd.map(to_logo)).collect())
                .collect();
            if subpaths.is_empty() {
                continue;
            }
            shapes.push(LogoShape {
                fill,
                even_odd: attrs.get("fill-rule").map(String::as_str) == Some("evenodd"),
                subpaths,
            });
        }

        if shapes.is_empty() {
            return Err(LogoError::Empty);
        }
        Ok(Self {
            width,
            height,
            shapes,
        })
    }

    /// Shapes translated and scaled onto the page with their
    /// bottom-left corner at `(x, y)`.
    pub fn place(&self, x: f32, y: f32, scale: f32) -> Vec<LogoShape> {
        let height = self.height;
        let to_page = |p: Point| Point::new(x + p.x * scale, y + (height - p.y) * scale);
        self.shapes
            .iter()
            .map(|shape| LogoShape {
                fill: shape.fill,
                even_odd: shape.even_odd,
                subpaths: shape
                    .subpaths
                    .iter()
                    .map(|subpath| subpath.iter().map(|cmd| cmd.map(to_page)).collect())
                    .collect(),
            })
            .collect()
    }
}

/// Scale that fits a `width` x `height` drawing into the bounding box
/// while preserving aspect ratio.  Never enlarges.
pub fn fit_scale(width: f32, height: f32, box_width: f32, box_height: f32) -> f32 {
    let by_width = if width > 0.0 { box_width / width } else { 1.0 };
    let by_height = if height > 0.0 { box_height / height } else { 1.0 };
    by_width.min(by_height).min(1.0)
}

fn attributes(source: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(source)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
            Some((name, value))
        })
        .collect()
}

fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    number.trim().parse::<f32>().ok().filter(|v| *v > 0.0)
}

fn parse_view_box(value: &str) -> Option<[f32; 4]> {
    let numbers: Vec<f32> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some([*x, *y, *w, *h]),
        _ => None,
    }
}

/// `Ok(None)` means the shape is not painted (`fill="none"`).
fn fill_of(attrs: &HashMap<String, String>) -> Result<Option<Rgb>, LogoError> {
    let from_style = attrs
        .get("style")
        .and_then(|style| STYLE_FILL.captures(style))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());
    let value = from_style.or_else(|| attrs.get("fill").map(|v| v.trim().to_string()));
    match value.as_deref() {
        None | Some("black") | Some("currentColor") => Ok(Some(Rgb::BLACK)),
        Some("none") | Some("transparent") => Ok(None),
        Some("white") => Ok(Some(Rgb::WHITE)),
        Some(other) => Rgb::from_hex(other)
            .map(Some)
            .ok_or_else(|| LogoError::UnsupportedColor(other.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f32),
}

fn snippet(data: &str, at: usize) -> String {
    data[at..].chars().take(12).collect()
}

fn tokenize(data: &str) -> Result<Vec<Token>, LogoError> {
    let bytes = data.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() || c == b',' {
            i += 1;
            continue;
        }
        if c.is_ascii_alphabetic() {
            tokens.push(Token::Command(c as char));
            i += 1;
            continue;
        }

        let start = i;
        if c == b'+' || c == b'-' {
            i += 1;
        }
        let mut digits = 0;
        let mut seen_dot = false;
        while i < bytes.len() {
            match bytes[i] {
                b'0'..=b'9' => digits += 1,
                b'.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            i += 1;
        }
        if digits == 0 {
            return Err(LogoError::MalformedPath(snippet(data, start)));
        }
        if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
            let mut j = i + 1;
            if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                j += 1;
            }
            let exponent_start = j;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > exponent_start {
                i = j;
            }
        }
        let value = data[start..i]
            .parse::<f32>()
            .map_err(|_| LogoError::MalformedPath(snippet(data, start)))?;
        tokens.push(Token::Number(value));
    }
    Ok(tokens)
}

#[derive(Default)]
struct PathBuilder {
    subpaths: Vec<Vec<PathCmd>>,
    current: Vec<PathCmd>,
    pos: Point,
    start: Point,
    cubic_ctrl: Option<Point>,
    quad_ctrl: Option<Point>,
}

impl PathBuilder {
    fn flush(&mut self) {
        let subpath = std::mem::take(&mut self.current);
        if subpath.len() > 1 {
            self.subpaths.push(subpath);
        }
    }

    fn ensure_started(&mut self) {
        if self.current.is_empty() {
            self.current.push(PathCmd::MoveTo(self.pos));
        }
    }

    fn move_to(&mut self, p: Point) {
        self.flush();
        self.current.push(PathCmd::MoveTo(p));
        self.pos = p;
        self.start = p;
    }

    fn line_to(&mut self, p: Point) {
        self.ensure_started();
        self.current.push(PathCmd::LineTo(p));
        self.pos = p;
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.ensure_started();
        self.current.push(PathCmd::CubicTo(c1, c2, p));
        self.pos = p;
    }

    fn quad_to(&mut self, q: Point, p: Point) {
        let p0 = self.pos;
        let c1 = Point::new(p0.x + 2.0 / 3.0 * (q.x - p0.x), p0.y + 2.0 / 3.0 * (q.y - p0.y));
        let c2 = Point::new(p.x + 2.0 / 3.0 * (q.x - p.x), p.y + 2.0 / 3.0 * (q.y - p.y));
        self.cubic_to(c1, c2, p);
    }

    fn close(&mut self) {
        if !self.current.is_empty() && self.pos != self.start {
            self.current.push(PathCmd::LineTo(self.start));
        }
        self.flush();
        self.pos = self.start;
    }

    fn reflect(&self, ctrl: Option<Point>) -> Point {
        match ctrl {
            Some(c) => Point::new(2.0 * self.pos.x - c.x, 2.0 * self.pos.y - c.y),
            None => self.pos,
        }
    }

    fn finish(mut self) -> Vec<Vec<PathCmd>> {
        self.flush();
        self.subpaths
    }
}

struct Operands<'a> {
    tokens: std::iter::Peekable<std::slice::Iter<'a, Token>>,
}

impl Operands<'_> {
    fn number(&mut self) -> Result<f32, LogoError> {
        match self.tokens.next() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::Command(c)) => Err(LogoError::MalformedPath(format!(
                "{c} where a number was expected"
            ))),
            None => Err(LogoError::MalformedPath("unexpected end of path data".into())),
        }
    }

    fn point(&mut self, origin: Point, relative: bool) -> Result<Point, LogoError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(if relative {
            Point::new(origin.x + x, origin.y + y)
        } else {
            Point::new(x, y)
        })
    }
}

/// Parse SVG path data into subpaths of absolute commands.
pub fn parse_path_data(data: &str) -> Result<Vec<Vec<PathCmd>>, LogoError> {
    let tokens = tokenize(data)?;
    let mut ops = Operands {
        tokens: tokens.iter().peekable(),
    };
    let mut builder = PathBuilder::default();
    let mut command: Option<char> = None;

    while let Some(token) = ops.tokens.peek().copied() {
        match *token {
            Token::Command(c) => {
                ops.tokens.next();
                command = Some(c);
                if c == 'Z' || c == 'z' {
                    builder.close();
                    builder.cubic_ctrl = None;
                    builder.quad_ctrl = None;
                    continue;
                }
            }
            // Implicit repetition: extra pairs after a moveto are linetos.
            Token::Number(_) => match command {
                Some('M') => command = Some('L'),
                Some('m') => command = Some('l'),
                Some('Z') | Some('z') | None => {
                    return Err(LogoError::MalformedPath("number without a command".into()))
                }
                _ => {}
            },
        }

        let Some(cmd) = command else {
            return Err(LogoError::MalformedPath("number without a command".into()));
        };
        let relative = cmd.is_ascii_lowercase();
        let origin = builder.pos;
        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;

        match cmd.to_ascii_uppercase() {
            'M' => {
                let p = ops.point(origin, relative)?;
                builder.move_to(p);
            }
            'L' => {
                let p = ops.point(origin, relative)?;
                builder.line_to(p);
            }
            'H' => {
                let x = ops.number()?;
                let x = if relative { origin.x + x } else { x };
                builder.line_to(Point::new(x, origin.y));
            }
            'V' => {
                let y = ops.number()?;
                let y = if relative { origin.y + y } else { y };
                builder.line_to(Point::new(origin.x, y));
            }
            'C' => {
                let c1 = ops.point(origin, relative)?;
                let c2 = ops.point(origin, relative)?;
                let p = ops.point(origin, relative)?;
                builder.cubic_to(c1, c2, p);
                cubic_ctrl = Some(c2);
            }
            'S' => {
                let c1 = builder.reflect(builder.cubic_ctrl);
                let c2 = ops.point(origin, relative)?;
                let p = ops.point(origin, relative)?;
                builder.cubic_to(c1, c2, p);
                cubic_ctrl = Some(c2);
            }
            'Q' => {
                let q = ops.point(origin, relative)?;
                let p = ops.point(origin, relative)?;
                builder.quad_to(q, p);
                quad_ctrl = Some(q);
            }
            'T' => {
                let q = builder.reflect(builder.quad_ctrl);
                let p = ops.point(origin, relative)?;
                builder.quad_to(q, p);
                quad_ctrl = Some(q);
            }
            other => return Err(LogoError::UnsupportedCommand(other)),
        }
        builder.cubic_ctrl = cubic_ctrl;
        builder.quad_ctrl = quad_ctrl;
    }

    Ok(builder.finish())
}
