//! PDF output for laid-out pages.
//!
//! A [`Page`] is written as a single-page document using the built-in
//! Helvetica fonts, so no font files need to ship with the binary.

use crate::fonts::Font;
use crate::layout::{Align, DrawOp, Page, Rgb};
use crate::logo::{LogoShape, PathCmd, Point};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Polygon,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF backend error: {0}")]
    Backend(String),
}

fn pt_to_mm(value: f32) -> Mm {
    Mm(value * 25.4 / 72.0)
}

fn point(p: Point) -> printpdf::Point {
    printpdf::Point::new(pt_to_mm(p.x), pt_to_mm(p.y))
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        f32::from(rgb.r) / 255.0,
        f32::from(rgb.g) / 255.0,
        f32::from(rgb.b) / 255.0,
        None,
    ))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Helvetica => &self.regular,
            Font::HelveticaBold => &self.bold,
        }
    }
}

/// Encode a subpath the way `printpdf` expects: a point flagged `true`
/// followed by another flagged `true` opens a cubic curve whose two
/// control points and end point follow.
fn encode_subpath(subpath: &[PathCmd]) -> Vec<(printpdf::Point, bool)> {
    let mut points: Vec<(printpdf::Point, bool)> = Vec::with_capacity(subpath.len() * 3);
    for cmd in subpath {
        match *cmd {
            PathCmd::MoveTo(p) | PathCmd::LineTo(p) => points.push((point(p), false)),
            PathCmd::CubicTo(c1, c2, end) => {
                if let Some(last) = points.last_mut() {
                    last.1 = true;
                }
                points.push((point(c1), true));
                points.push((point(c2), false));
                points.push((point(end), false));
            }
        }
    }
    points
}

fn draw_shape(layer: &PdfLayerReference, shape: &LogoShape) {
    layer.set_fill_color(color(shape.fill));
    let polygon = Polygon {
        rings: shape.subpaths.iter().map(|s| encode_subpath(s)).collect(),
        mode: PaintMode::Fill,
        winding_order: if shape.even_odd {
            WindingOrder::EvenOdd
        } else {
            WindingOrder::NonZero
        },
    };
    layer.add_polygon(polygon);
}

/// Render `page` to PDF bytes.
pub fn render_pdf(page: &Page, title: &str) -> Result<Vec<u8>, RenderError> {
    let (doc, page_index, layer_index) =
        PdfDocument::new(title, pt_to_mm(page.width), pt_to_mm(page.height), "Payslip");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Backend(format!("{e:?}")))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Backend(format!("{e:?}")))?,
    };
    let layer = doc.get_page(page_index).get_layer(layer_index);

    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                text,
                font,
                size,
                color: rgb,
                align,
            } => {
                let x = match align {
                    Align::Left => *x,
                    Align::Right => *x - font.string_width(text, *size),
                };
                layer.set_fill_color(color(*rgb));
                layer.use_text(text.as_str(), *size, pt_to_mm(x), pt_to_mm(*y), fonts.get(*font));
            }
            DrawOp::Line {
                from,
                to,
                width,
                color: rgb,
            } => {
                layer.set_outline_color(color(*rgb));
                layer.set_outline_thickness(*width);
                layer.add_line(Line {
                    points: vec![
                        (point(Point::new(from.0, from.1)), false),
                        (point(Point::new(to.0, to.1)), false),
                    ],
                    is_closed: false,
                });
            }
            DrawOp::Shape(shape) => draw_shape(&layer, shape),
        }
    }

    doc.save_to_bytes()
        .map_err(|e| RenderError::Backend(format!("{e:?}")))
}
