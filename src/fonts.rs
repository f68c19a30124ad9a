//! Advance widths for the two built-in PDF fonts the payslip uses.
//!
//! Values are the Adobe AFM widths (units of 1/1000 em) for the
//! printable ASCII range `0x20..=0x7E`.  Characters outside that range
//! are measured as a digit.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

impl Font {
    fn widths(self) -> &'static [u16; 95] {
        match self {
            Font::Helvetica => &HELVETICA,
            Font::HelveticaBold => &HELVETICA_BOLD,
        }
    }

    /// Width of `text` in points at `size`.
    pub fn string_width(self, text: &str, size: f32) -> f32 {
        let table = self.widths();
        let units: u32 = text
            .chars()
            .map(|c| {
                let code = c as u32;
                if (0x20..=0x7E).contains(&code) {
                    u32::from(table[(code - 0x20) as usize])
                } else {
                    u32::from(FALLBACK_WIDTH)
                }
            })
            .sum();
        units as f32 * size / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_share_one_width() {
        let a = Font::Helvetica.string_width("1,234.00", 10.0);
        let b = Font::Helvetica.string_width("9,876.55", 10.0);
        assert!((a - b).abs() < f32::EPSILON);
    }

    #[test]
    fn bold_is_wider_than_regular() {
        let regular = Font::Helvetica.string_width("PAYSLIP", 18.0);
        let bold = Font::HelveticaBold.string_width("PAYSLIP", 18.0);
        assert!(bold > regular);
        // P A Y S L I P in Helvetica-Bold: 667+722+667+667+611+278+667
        assert!((bold - 4279.0 * 18.0 / 1000.0).abs() < 1e-3);
    }

    #[test]
    fn empty_text_has_no_width() {
        assert_eq!(Font::HelveticaBold.string_width("", 12.0), 0.0);
    }
}
