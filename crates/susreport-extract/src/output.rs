//! Extraction output files
//!
//! Layout of an output directory:
//!
//! ```text
//! page_1_text.txt     page text
//! page_1_data.txt     value/unit/description listing (only pages with data)
//! ...
//! full_text.txt       every page under a `===== 第 N 頁 =====` header
//! extraction.json     full report (optional)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use susreport_types::{DataBlock, ExtractionReport, PageRecord};
use tracing::info;

use crate::error::ExtractError;

pub const FULL_TEXT_FILE: &str = "full_text.txt";
pub const REPORT_JSON_FILE: &str = "extraction.json";

const RECORD_SEPARATOR_WIDTH: usize = 30;

/// `數值/單位/描述` records, each followed by a dashed separator line
pub fn format_data_listing(blocks: &[DataBlock]) -> String {
    let mut out = String::new();
    for item in blocks {
        out.push_str(&format!("數值: {}\n", item.value));
        out.push_str(&format!("單位: {}\n", item.unit));
        out.push_str(&format!("描述: {}\n", item.description));
        out.push_str(&"-".repeat(RECORD_SEPARATOR_WIDTH));
        out.push('\n');
    }
    out
}

/// All page texts, each preceded by its page header
pub fn format_full_text(pages: &[PageRecord]) -> String {
    let mut out = String::new();
    for page in pages {
        out.push_str(&format!("\n===== 第 {} 頁 =====\n", page.page_number));
        out.push_str(&page.text);
        out.push('\n');
    }
    out
}

/// Plain page dump under `=== 第 N 頁 ===` headers, skipping failed and
/// empty pages
pub fn format_page_dump(pages: &[PageRecord]) -> String {
    let mut out = String::new();
    for page in pages {
        if page.is_failed() || page.text.trim().is_empty() {
            continue;
        }
        out.push_str(&format!("=== 第 {} 頁 ===\n", page.page_number));
        out.push_str(&page.text);
        out.push_str("\n\n");
    }
    out
}

/// Write the plain page dump of a report to a single file
pub fn write_page_dump(report: &ExtractionReport, path: &Path) -> Result<(), ExtractError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format_page_dump(&report.pages))?;
    info!("Wrote text of {} to {}", report.metadata.filename, path.display());
    Ok(())
}

/// Writes an extraction report into a directory
pub struct ReportWriter {
    dir: PathBuf,
    write_json: bool,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_json: false,
        }
    }

    /// Also write the full report as `extraction.json`
    pub fn with_json(mut self, enabled: bool) -> Self {
        self.write_json = enabled;
        self
    }

    /// Write all files, creating the directory if needed
    ///
    /// Returns the path of the concatenated full-text file.
    pub fn write(&self, report: &ExtractionReport) -> Result<PathBuf, ExtractError> {
        fs::create_dir_all(&self.dir)?;

        for page in &report.pages {
            self.write_page(page)?;
        }

        let full_text_path = self.dir.join(FULL_TEXT_FILE);
        fs::write(&full_text_path, format_full_text(&report.pages))?;

        if self.write_json {
            let json = serde_json::to_string_pretty(report)?;
            fs::write(self.dir.join(REPORT_JSON_FILE), json)?;
        }

        info!(
            "Wrote {} pages to {}",
            report.pages.len(),
            self.dir.display()
        );

        Ok(full_text_path)
    }

    fn write_page(&self, page: &PageRecord) -> Result<(), ExtractError> {
        let n = page.page_number;
        fs::write(self.dir.join(format!("page_{}_text.txt", n)), &page.text)?;

        if !page.data_blocks.is_empty() {
            fs::write(
                self.dir.join(format!("page_{}_data.txt", n)),
                format_data_listing(&page.data_blocks),
            )?;
        }
        Ok(())
    }
}
