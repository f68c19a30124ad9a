//! Payslip page layout.
//!
//! [`render`] places a composed [`PayslipModel`] onto a fixed A4 page.
//! Every block is positioned from a running vertical cursor that starts
//! at the top margin and only moves down, so resizing one block shifts
//! the blocks below it without touching their own geometry.
//!
//! The output is a device-independent [`Page`]: an ordered list of
//! drawing operations in PDF points (origin bottom-left).  Turning it
//! into bytes is the job of [`crate::pdf`].

use crate::fonts::Font;
use crate::logo::{fit_scale, Logo, LogoError, LogoShape};
use crate::models::{EmployeeRecord, LineItem, PayslipModel};
use crate::money::{format_amount, format_days};
use rust_decimal::Decimal;

/// Millimetres to points.
pub const MM: f32 = 72.0 / 25.4;
pub const A4_WIDTH: f32 = 595.2756;
pub const A4_HEIGHT: f32 = 841.8898;

const LEFT_MARGIN: f32 = 14.0 * MM;
const RIGHT_MARGIN: f32 = 14.0 * MM;
const TOP_MARGIN: f32 = 16.0 * MM;
const LOGO_BOX_WIDTH: f32 = 40.0 * MM;
const LOGO_BOX_HEIGHT: f32 = 20.0 * MM;
const AMOUNT_INSET: f32 = 4.0 * MM;
const COLUMN_PADDING: f32 = 5.0 * MM;
const ROW_STEP: f32 = 5.0 * MM;

const TEXT_COLOR: Rgb = Rgb::BLACK;
const SUBDUED_COLOR: Rgb = Rgb::new(0x50, 0x50, 0x50);
const LABEL_COLOR: Rgb = Rgb::new(0x85, 0x85, 0x85);
const RULE_COLOR: Rgb = Rgb::new(0xDC, 0xDC, 0xDC);

const FOOTER_LINES: [&str; 2] = [
    "Note: All amounts displayed in this payslip are in INR",
    "This is computer generated statement, does not require signature.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses exactly `#RRGGBB`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        Some(Self::new(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ))
    }
}

/// Company identity printed in the header.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub name: String,
    pub address_lines: Vec<String>,
    /// Accent colour for the title and the heavy section rules.
    pub brand_color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    /// `x` is the right edge of the text.
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        font: Font,
        size: f32,
        color: Rgb,
        align: Align,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgb,
    },
    Shape(LogoShape),
}

/// Non-fatal problems met while laying out a page.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutWarning {
    LogoSkipped(LogoError),
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutWarning::LogoSkipped(err) => write!(f, "logo skipped: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
    pub warnings: Vec<LayoutWarning>,
}

/// Drawing state in the style of a PDF canvas: colours, line width and
/// font are set once and apply to the following operations.
struct Canvas {
    ops: Vec<DrawOp>,
    fill: Rgb,
    stroke: Rgb,
    line_width: f32,
    font: Font,
    size: f32,
}

impl Canvas {
    fn new() -> Self {
        Self {
            ops: Vec::new(),
            fill: TEXT_COLOR,
            stroke: TEXT_COLOR,
            line_width: 1.0,
            font: Font::Helvetica,
            size: 10.0,
        }
    }

    fn set_font(&mut self, font: Font, size: f32) {
        self.font = font;
        self.size = size;
    }

    fn set_fill(&mut self, color: Rgb) {
        self.fill = color;
    }

    fn set_stroke(&mut self, color: Rgb, width: f32) {
        self.stroke = color;
        self.line_width = width;
    }

    fn text(&mut self, x: f32, y: f32, text: impl Into<String>, align: Align) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            font: self.font,
            size: self.size,
            color: self.fill,
            align,
        });
    }

    fn draw_string(&mut self, x: f32, y: f32, text: impl Into<String>) {
        self.text(x, y, text, Align::Left);
    }

    fn draw_right_string(&mut self, x: f32, y: f32, text: impl Into<String>) {
        self.text(x, y, text, Align::Right);
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.ops.push(DrawOp::Line {
            from: (x1, y1),
            to: (x2, y2),
            width: self.line_width,
            color: self.stroke,
        });
    }
}

/// Geometry shared by every block.
struct Frame {
    left: f32,
    usable_width: f32,
}

impl Frame {
    fn right(&self) -> f32 {
        self.left + self.usable_width
    }

    fn rule(&self, canvas: &mut Canvas, y: f32) {
        canvas.line(self.left, y, self.right(), y);
    }
}

/// Lay out the payslip for `record` described by `model`.
///
/// A logo that fails to parse is recorded in [`Page::warnings`] and the
/// page is produced without it.
pub fn render(
    model: &PayslipModel,
    record: &EmployeeRecord,
    company: &CompanyProfile,
    logo_svg: Option<&str>,
) -> Page {
    let frame = Frame {
        left: LEFT_MARGIN,
        usable_width: A4_WIDTH - LEFT_MARGIN - RIGHT_MARGIN,
    };
    let mut canvas = Canvas::new();
    let mut warnings = Vec::new();
    let top = A4_HEIGHT - TOP_MARGIN;

    let mut y = header(&mut canvas, &frame, top, model, company);
    if let Some(svg) = logo_svg {
        if let Err(err) = place_logo(&mut canvas, top, svg) {
            warnings.push(LayoutWarning::LogoSkipped(err));
        }
    }
    y -= 10.0 * MM;

    y = employee_name(&mut canvas, &frame, y, record, company);
    y = info_grids(&mut canvas, &frame, y, record);
    y = salary_details(&mut canvas, &frame, y, model, company);
    y = earnings_and_deductions(&mut canvas, &frame, y, model);
    y = summary(&mut canvas, &frame, y, model, company);
    footer(&mut canvas, &frame, y);

    Page {
        width: A4_WIDTH,
        height: A4_HEIGHT,
        ops: canvas.ops,
        warnings,
    }
}

fn header(
    canvas: &mut Canvas,
    frame: &Frame,
    top: f32,
    model: &PayslipModel,
    company: &CompanyProfile,
) -> f32 {
    let mut y = top;
    canvas.set_fill(company.brand_color);
    canvas.set_font(Font::HelveticaBold, 18.0);
    canvas.draw_string(frame.left, y, "PAYSLIP");
    let title_width = Font::HelveticaBold.string_width("PAYSLIP", 18.0);

    canvas.set_fill(SUBDUED_COLOR);
    canvas.set_font(Font::Helvetica, 18.0);
    let period = format!(
        " {} {}",
        model.period.month_name().to_uppercase(),
        model.period.year()
    );
    canvas.draw_string(frame.left + title_width, y, period);
    y -= ROW_STEP;

    canvas.set_fill(TEXT_COLOR);
    canvas.set_font(Font::HelveticaBold, 12.0);
    canvas.draw_string(frame.left, y, company.name.to_uppercase());
    y -= ROW_STEP;

    canvas.set_font(Font::Helvetica, 8.0);
    for line in &company.address_lines {
        canvas.draw_string(frame.left, y, line.trim());
        y -= ROW_STEP;
    }
    y
}

/// Right-aligned inside the logo box, hanging 10 mm below the top margin.
fn place_logo(canvas: &mut Canvas, top: f32, svg: &str) -> Result<(), LogoError> {
    let logo = Logo::parse(svg)?;
    let scale = fit_scale(logo.width, logo.height, LOGO_BOX_WIDTH, LOGO_BOX_HEIGHT);
    let x = A4_WIDTH - RIGHT_MARGIN - logo.width * scale;
    let y = top - logo.height * scale - 10.0 * MM;
    canvas
        .ops
        .extend(logo.place(x, y, scale).into_iter().map(DrawOp::Shape));
    Ok(())
}

fn employee_name(
    canvas: &mut Canvas,
    frame: &Frame,
    mut y: f32,
    record: &EmployeeRecord,
    company: &CompanyProfile,
) -> f32 {
    canvas.set_fill(TEXT_COLOR);
    canvas.set_font(Font::HelveticaBold, 12.0);
    canvas.draw_string(frame.left, y, record.full_name.trim().to_uppercase());
    y -= ROW_STEP;
    canvas.set_stroke(company.brand_color, 1.5);
    frame.rule(canvas, y);
    y - ROW_STEP
}

/// Labels in small grey type over bold values, four equal columns,
/// closed by a light rule.
fn grid_row(canvas: &mut Canvas, frame: &Frame, mut y: f32, cells: [(&str, String); 4]) -> f32 {
    let column = frame.usable_width / cells.len() as f32;

    canvas.set_fill(LABEL_COLOR);
    canvas.set_font(Font::Helvetica, 7.0);
    for (i, (label, _)) in cells.iter().enumerate() {
        canvas.draw_string(frame.left + column * i as f32, y, *label);
    }
    y -= 4.0 * MM;

    canvas.set_fill(TEXT_COLOR);
    canvas.set_font(Font::HelveticaBold, 9.0);
    for (i, (_, value)) in cells.iter().enumerate() {
        canvas.draw_string(frame.left + column * i as f32, y, value.clone());
    }
    y -= ROW_STEP;

    canvas.set_stroke(RULE_COLOR, 0.5);
    frame.rule(canvas, y);
    y - ROW_STEP
}

fn info_grids(canvas: &mut Canvas, frame: &Frame, mut y: f32, record: &EmployeeRecord) -> f32 {
    y = grid_row(
        canvas,
        frame,
        y,
        [
            ("Employee Number", record.employee_id.clone()),
            ("Date Joined", record.date_of_joining.display()),
            ("Department", record.department.clone()),
            ("Sub Department", record.sub_department.clone()),
        ],
    );
    y = grid_row(
        canvas,
        frame,
        y,
        [
            ("Designation", record.designation.clone()),
            ("Payment Mode", record.payment_mode.clone()),
            ("Bank", record.bank.clone()),
            ("Bank IFSC", record.bank_ifsc.clone()),
        ],
    );
    y = grid_row(
        canvas,
        frame,
        y,
        [
            ("Bank Account", record.bank_account.clone()),
            ("PAN", record.pan.clone()),
            ("UAN", record.uan.clone()),
            ("PF Number", record.pf_number.clone()),
        ],
    );
    y - ROW_STEP
}

fn salary_details(
    canvas: &mut Canvas,
    frame: &Frame,
    mut y: f32,
    model: &PayslipModel,
    company: &CompanyProfile,
) -> f32 {
    canvas.set_stroke(company.brand_color, 1.5);
    frame.rule(canvas, y);
    y -= ROW_STEP;

    canvas.set_fill(TEXT_COLOR);
    canvas.set_font(Font::HelveticaBold, 10.0);
    canvas.draw_string(frame.left, y, "SALARY DETAILS");
    y -= ROW_STEP;

    canvas.set_stroke(TEXT_COLOR, 0.5);
    frame.rule(canvas, y);
    y -= ROW_STEP;

    let days = &model.days;
    let y = grid_row(
        canvas,
        frame,
        y,
        [
            ("Actual Payable Days", format_days(days.actual_payable_days)),
            ("Total Working Days", format_days(days.total_working_days)),
            ("Loss of Pay Days", format_days(days.loss_of_pay_days)),
            ("Days Payable", format_days(days.days_payable)),
        ],
    );
    y - ROW_STEP
}

/// One half of the two-column block.  Returns the cursor below the
/// subtotal.
#[allow(clippy::too_many_arguments)]
fn column(
    canvas: &mut Canvas,
    x: f32,
    amount_right: f32,
    top: f32,
    title: &str,
    items: &[LineItem],
    total_label: &str,
    total: Decimal,
) -> f32 {
    canvas.set_fill(TEXT_COLOR);
    canvas.set_font(Font::HelveticaBold, 10.0);
    canvas.draw_string(x, top, title);

    let mut y = top - 7.0 * MM;
    canvas.set_font(Font::Helvetica, 8.5);
    for item in items {
        canvas.draw_string(x, y, item.label.as_str());
        canvas.draw_right_string(amount_right, y, format_amount(item.amount));
        y -= ROW_STEP;
    }

    let total_y = y - 3.0 * MM;
    canvas.set_font(Font::HelveticaBold, 9.0);
    canvas.draw_string(x, total_y, total_label);
    canvas.draw_right_string(amount_right, total_y, format_amount(total));
    y
}

fn earnings_and_deductions(
    canvas: &mut Canvas,
    frame: &Frame,
    y: f32,
    model: &PayslipModel,
) -> f32 {
    let half = frame.usable_width * 0.5;
    let left_x = frame.left;
    let right_x = frame.left + half;

    let earnings_end = column(
        canvas,
        left_x,
        left_x + half - AMOUNT_INSET,
        y,
        "EARNINGS",
        &model.earnings,
        "Total Earnings (A)",
        model.total_earnings,
    );
    let deductions_end = column(
        canvas,
        right_x + COLUMN_PADDING,
        right_x + half - AMOUNT_INSET,
        y,
        "TAXES & DEDUCTIONS",
        &model.deductions,
        "Total Deductions (C)",
        model.total_deductions,
    );

    let lowest = earnings_end.min(deductions_end);
    canvas.set_stroke(RULE_COLOR, 1.0);
    canvas.line(right_x, y + ROW_STEP, right_x, lowest - ROW_STEP);
    lowest - 20.0 * MM
}

fn summary(
    canvas: &mut Canvas,
    frame: &Frame,
    mut y: f32,
    model: &PayslipModel,
    company: &CompanyProfile,
) -> f32 {
    canvas.set_stroke(company.brand_color, 1.5);
    frame.rule(canvas, y);
    y -= ROW_STEP;

    canvas.set_fill(TEXT_COLOR);
    canvas.set_font(Font::HelveticaBold, 10.0);
    canvas.draw_string(frame.left, y, "Net Salary Payable (A-C)");
    canvas.draw_right_string(frame.right(), y, format_amount(model.net_salary));
    y -= 7.0 * MM;

    canvas.set_font(Font::Helvetica, 8.0);
    canvas.draw_string(frame.left, y, "Net Salary in words");
    canvas.draw_right_string(frame.right(), y, model.net_salary_in_words.as_str());
    y - 15.0 * MM
}

fn footer(canvas: &mut Canvas, frame: &Frame, mut y: f32) {
    canvas.set_fill(SUBDUED_COLOR);
    canvas.set_font(Font::Helvetica, 7.0);
    for line in FOOTER_LINES {
        canvas.draw_string(frame.left, y, line);
        y -= ROW_STEP;
    }
}
