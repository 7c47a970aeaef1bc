//! Advance widths of the standard PDF Helvetica faces.
//!
//! Widths are in 1/1000 em for the printable ASCII range (32..=126), taken
//! from the Adobe core font metrics. Anything outside that range is measured
//! with [`FALLBACK_ADVANCE`].

use super::render::{FontFace, TextStyle};

/// Ascender height as a fraction of the font size.
pub const ASCENT: f32 = 0.718;

const FALLBACK_ADVANCE: u16 = 556;

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

fn advance(ch: char, face: FontFace) -> u16 {
    let table = match face {
        FontFace::Regular => &HELVETICA,
        FontFace::Bold => &HELVETICA_BOLD,
    };
    (ch as u32)
        .checked_sub(32)
        .and_then(|index| table.get(index as usize))
        .copied()
        .unwrap_or(FALLBACK_ADVANCE)
}

/// Width of `text` in points when set in `style`.
pub fn text_width(text: &str, style: TextStyle) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(advance(ch, style.face))).sum();
    units as f32 * style.size / 1000.0
}
