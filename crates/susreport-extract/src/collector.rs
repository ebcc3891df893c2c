//! Glyph collection backend built on pdf-extract's `OutputDev`
//!
//! pdf-extract walks a page's content stream and reports every glyph with
//! its text rendering matrix. This collector turns that stream into spans:
//! consecutive glyphs on the same baseline, at the same size, with no large
//! horizontal jump between them.

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use susreport_types::{BBox, TextSpan};

/// Fraction of the font size above the baseline used as the glyph top
const ASCENT: f64 = 0.8;
/// Fraction of the font size below the baseline used as the glyph bottom
const DESCENT: f64 = 0.2;
/// Horizontal gap (in font sizes) that still continues the current span
const MAX_SPAN_GAP: f64 = 0.6;
/// Horizontal gap (in font sizes) rendered as a space inside a span
const WORD_GAP: f64 = 0.25;

struct OpenSpan {
    text: String,
    bbox: BBox,
    baseline: f64,
    font_size: f64,
}

/// Collects the spans of one page
#[derive(Default)]
pub struct SpanCollector {
    width: f64,
    height: f64,
    origin_x: f64,
    top: f64,
    spans: Vec<TextSpan>,
    open: Option<OpenSpan>,
}

impl SpanCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the collected spans and the page width and height,
    /// closing any span still open
    pub fn finish(mut self) -> (Vec<TextSpan>, f64, f64) {
        self.flush();
        (self.spans, self.width, self.height)
    }

    fn flush(&mut self) {
        if let Some(open) = self.open.take() {
            let text = open.text.trim_end().to_string();
            if !text.is_empty() {
                self.spans.push(TextSpan {
                    text,
                    bbox: open.bbox,
                    font_size: open.font_size,
                });
            }
        }
    }

    /// Decide whether a glyph at (`x0`, `baseline`) continues the open span
    fn continues_open_span(&self, x0: f64, baseline: f64, size: f64) -> bool {
        match &self.open {
            Some(open) => {
                let tolerance = open.font_size.max(size) * 0.1;
                (open.baseline - baseline).abs() <= tolerance
                    && (open.font_size - size).abs() <= tolerance
                    && x0 >= open.bbox.x0
                    && x0 - open.bbox.x1 <= MAX_SPAN_GAP * size
            }
            None => false,
        }
    }

    fn push_glyph(&mut self, text: &str, glyph: BBox, baseline: f64, size: f64) {
        let blank = text.trim().is_empty();

        if !self.continues_open_span(glyph.x0, baseline, size) {
            self.flush();
            if blank {
                return;
            }
            self.open = Some(OpenSpan {
                text: text.to_string(),
                bbox: glyph,
                baseline,
                font_size: size,
            });
            return;
        }

        if let Some(open) = self.open.as_mut() {
            let gap = glyph.x0 - open.bbox.x1;
            if !blank && gap > WORD_GAP * size && !open.text.ends_with(char::is_whitespace) {
                open.text.push(' ');
            }
            open.text.push_str(text);
            open.bbox = open.bbox.union(&glyph);
        }
    }
}

impl OutputDev for SpanCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.spans.clear();
        self.open = None;
        self.origin_x = media_box.llx;
        self.top = media_box.ury;
        self.width = media_box.urx - media_box.llx;
        self.height = media_box.ury - media_box.lly;
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.flush();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        let scale_x = trm.m11.hypot(trm.m12);
        let scale_y = trm.m21.hypot(trm.m22);
        let size = font_size * scale_y;
        let advance = width * font_size * scale_x;

        let x0 = trm.m31 - self.origin_x;
        let baseline = self.top - trm.m32;
        let glyph = BBox::new(
            x0,
            baseline - ASCENT * size,
            x0 + advance,
            baseline + DESCENT * size,
        );

        self.push_glyph(char, glyph, baseline, size);
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        self.flush();
        Ok(())
    }
}
