//! Page geometry shared by the extraction stages
//!
//! Coordinates use a top-left origin: `y0` is the top edge and grows
//! downwards, matching how report pages are read.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box `[x0, y0, x1, y1]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// True when the x-ranges intersect with non-zero width
    pub fn overlaps_horizontally(&self, other: &BBox) -> bool {
        other.x0 < self.x1 && other.x1 > self.x0
    }

    /// Distance from this box's bottom edge down to `other`'s top edge,
    /// or `None` when `other` does not start strictly below.
    pub fn gap_below(&self, other: &BBox) -> Option<f64> {
        if other.y0 > self.y1 {
            Some(other.y0 - self.y1)
        } else {
            None
        }
    }
}

impl From<[f64; 4]> for BBox {
    fn from([x0, y0, x1, y1]: [f64; 4]) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

/// A run of glyphs emitted by a single text-showing operation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f64,
}

/// Spans sharing a baseline
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub bbox: BBox,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Vertically contiguous group of lines
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub bbox: BBox,
}

impl TextBlock {
    /// All span texts joined by single spaces, trimmed
    pub fn text(&self) -> String {
        let mut text = String::new();
        for span in self.spans() {
            text.push_str(&span.text);
            text.push(' ');
        }
        text.trim().to_string()
    }

    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.lines.iter().flat_map(|l| l.spans.iter())
    }
}
