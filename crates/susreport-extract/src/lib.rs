//! PDF report extraction
//!
//! Turns a sustainability report PDF into per-page records:
//! - page text and a coarse layout classification
//! - values with units (`45%`, `1,234 噸`, `3.2億度`)
//! - a description for each value, taken from its own block or from the
//!   block right below it
//!
//! Glyph geometry comes from pdf-extract; everything above that is plain
//! heuristics over bounding boxes and regular expressions.

pub mod associate;
pub mod blocks;
pub mod collector;
pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod output;
pub mod patterns;

pub use config::ExtractionConfig;
pub use document::{analyze_page, ReportExtractor};
pub use error::ExtractError;
pub use output::{ReportWriter, FULL_TEXT_FILE};

use std::path::Path;
use susreport_types::ExtractionReport;

/// Extract a PDF and, when `output_dir` is given, write the text and data
/// files into it, plus `extraction.json` if `write_json` is set
pub fn extract_pdf_with_data(
    pdf_path: &Path,
    output_dir: Option<&Path>,
    config: &ExtractionConfig,
    write_json: bool,
) -> Result<ExtractionReport, ExtractError> {
    let report = ReportExtractor::new(config.clone()).extract_file(pdf_path)?;

    if let Some(dir) = output_dir {
        ReportWriter::new(dir).with_json(write_json).write(&report)?;
    }

    Ok(report)
}
