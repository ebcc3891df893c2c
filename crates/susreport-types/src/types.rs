use crate::geometry::BBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown in place of a page whose extraction failed
pub const FAILED_PAGE_TEXT: &str = "提取失敗";

/// Coarse page layout classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageLayout {
    /// Many small, dense text spans (KPI panels, infographics)
    Dashboard,
    MultiColumn,
    NormalText,
}

impl PageLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageLayout::Dashboard => "dashboard",
            PageLayout::MultiColumn => "multi_column",
            PageLayout::NormalText => "normal_text",
        }
    }
}

impl fmt::Display for PageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected value with its unit and description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBlock {
    /// Raw numeric string, commas and decimals preserved
    pub value: String,
    pub unit: String,
    /// Full text of the block the value was found in
    pub text: String,
    pub bbox: BBox,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-indexed
    pub page_number: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<PageLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data_blocks: Vec<DataBlock>,
}

impl PageRecord {
    /// Placeholder for a page that could not be extracted
    pub fn failed(page_number: u32, error: impl Into<String>) -> Self {
        Self {
            page_number,
            text: FAILED_PAGE_TEXT.to_string(),
            page_type: None,
            error: Some(error.into()),
            data_blocks: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Base name of the source file
    pub filename: String,
    pub pages: u32,
    pub title: String,
    pub author: String,
}

/// Everything extracted from one PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub metadata: DocumentMetadata,
    pub pages: Vec<PageRecord>,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractionReport {
    pub fn new(metadata: DocumentMetadata) -> Self {
        Self {
            metadata,
            pages: Vec::new(),
            extracted_at: Utc::now(),
        }
    }

    /// Total data blocks across all pages
    pub fn data_count(&self) -> usize {
        self.pages.iter().map(|p| p.data_blocks.len()).sum()
    }

    pub fn failed_pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.iter().filter(|p| p.is_failed())
    }
}
