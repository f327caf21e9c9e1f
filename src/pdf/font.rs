//! Metrics and encoding for the two standard fonts used by the overlays.
//!
//! Widths are the Adobe AFM advance widths of Helvetica and Helvetica-Bold,
//! expressed in 1/1000 of the font size. Kerning is not applied.

use serde::{Deserialize, Serialize};

/// Font weight of a drawn run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

impl FontWeight {
    pub fn base_font(self) -> &'static str {
        match self {
            FontWeight::Regular => "Helvetica",
            FontWeight::Bold => "Helvetica-Bold",
        }
    }

    /// Name under which the font is registered in a page's resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontWeight::Regular => "DfHelv",
            FontWeight::Bold => "DfHelvB",
        }
    }

    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            FontWeight::Regular => &HELVETICA_ASCII,
            FontWeight::Bold => &HELVETICA_BOLD_ASCII,
        }
    }

    fn latin1_widths(self) -> &'static [u16; 96] {
        match self {
            FontWeight::Regular => &HELVETICA_LATIN1,
            FontWeight::Bold => &HELVETICA_BOLD_LATIN1,
        }
    }
}

const EURO: u8 = 0x80;
const REPLACEMENT: u8 = b'?';

#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667,
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556,
    556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667,
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611,
    611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[rustfmt::skip]
const HELVETICA_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
const HELVETICA_BOLD_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

fn encode_char(c: char) -> Option<u8> {
    match c {
        ' '..='~' | '\u{A0}'..='\u{FF}' => Some(c as u32 as u8),
        '€' => Some(EURO),
        _ => None,
    }
}

fn code_width(code: u8, weight: FontWeight) -> u16 {
    match code {
        0x20..=0x7E => weight.ascii_widths()[(code - 0x20) as usize],
        0xA0..=0xFF => weight.latin1_widths()[(code - 0xA0) as usize],
        EURO => 556,
        _ => 0,
    }
}

/// Encodes text as WinAnsi bytes. Characters outside the supported
/// repertoire become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut unsupported = 0usize;
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| {
            encode_char(c).unwrap_or_else(|| {
                unsupported += 1;
                REPLACEMENT
            })
        })
        .collect();
    if unsupported > 0 {
        log::warn!(
            "{} character(s) not representable in WinAnsi were replaced in {:?}",
            unsupported,
            text
        );
    }
    bytes
}

/// Advance width of `text` in points, as it would be drawn at `size`.
pub fn width_of_text_at_size(text: &str, size: f32, weight: FontWeight) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| code_width(encode_char(c).unwrap_or(REPLACEMENT), weight) as u32)
        .sum();
    units as f32 * size / 1000.0
}
