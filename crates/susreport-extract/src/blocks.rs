//! Grouping of spans into lines and blocks
//!
//! Spans arrive in content-stream order. A span joins the current line when
//! it sits on the same baseline to the right of the previous span; a line
//! joins the current block when it starts just below it and overlaps it
//! horizontally.

use susreport_types::{BBox, TextBlock, TextLine, TextSpan};

/// Baseline drift (in line heights) tolerated within one line
const BASELINE_TOLERANCE: f64 = 0.25;
/// Largest gap (in line heights) between consecutive lines of one block
const BLOCK_LINE_GAP: f64 = 0.5;

/// Text geometry of one page
#[derive(Debug, Clone, Default)]
pub struct PageGeometry {
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
    pub blocks: Vec<TextBlock>,
}

impl PageGeometry {
    pub fn from_spans(page_number: u32, width: f64, height: f64, spans: Vec<TextSpan>) -> Self {
        Self {
            page_number,
            width,
            height,
            blocks: group_blocks(group_lines(spans)),
        }
    }

    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.blocks.iter().flat_map(|b| b.spans())
    }

    /// Page text: one line per text line, blocks separated by a blank line
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| {
                block
                    .lines
                    .iter()
                    .map(|l| l.text())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub fn group_lines(spans: Vec<TextSpan>) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();

    for span in spans {
        let joins = lines.last().and_then(|l| l.spans.last()).is_some_and(|prev| {
            let height = prev.bbox.height().max(span.bbox.height());
            (prev.bbox.y1 - span.bbox.y1).abs() <= BASELINE_TOLERANCE * height
                && span.bbox.x0 >= prev.bbox.x0
        });

        match lines.last_mut() {
            Some(line) if joins => {
                line.bbox = line.bbox.union(&span.bbox);
                line.spans.push(span);
            }
            _ => lines.push(TextLine {
                bbox: span.bbox,
                spans: vec![span],
            }),
        }
    }

    lines
}

pub fn group_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();

    for line in lines {
        let joins = blocks
            .last()
            .is_some_and(|block| continues_block(&block.bbox, &line.bbox));

        match blocks.last_mut() {
            Some(block) if joins => {
                block.bbox = block.bbox.union(&line.bbox);
                block.lines.push(line);
            }
            _ => blocks.push(TextBlock {
                bbox: line.bbox,
                lines: vec![line],
            }),
        }
    }

    blocks
}

fn continues_block(block: &BBox, line: &BBox) -> bool {
    let gap = line.y0 - block.y1;
    let height = line.height();
    gap >= -BLOCK_LINE_GAP * height
        && gap <= BLOCK_LINE_GAP * height
        && block.overlaps_horizontally(line)
}
