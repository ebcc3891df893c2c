//! Page and document extraction driver
//!
//! Pages are processed in order. A page that fails to extract is recorded
//! as a placeholder carrying the error and processing moves on; only a
//! missing or unparseable file aborts the run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use pdf_extract::{Document, Object};
use tracing::{debug, info, warn};

use susreport_types::{DocumentMetadata, ExtractionReport, PageRecord};

use crate::associate::{associate_descriptions, DescriptionCandidate};
use crate::blocks::PageGeometry;
use crate::collector::SpanCollector;
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::layout::classify_layout;
use crate::patterns::extract_data_from_text;

/// Layout classification, value detection and description association for
/// one page's geometry
pub fn analyze_page(geometry: &PageGeometry, config: &ExtractionConfig) -> PageRecord {
    let page_type = classify_layout(geometry.spans(), geometry.width);

    let candidates: Vec<DescriptionCandidate> = geometry
        .blocks
        .iter()
        .map(|block| DescriptionCandidate {
            text: block.text(),
            bbox: block.bbox,
        })
        .filter(|c| !c.text.is_empty())
        .collect();

    let data_blocks = candidates
        .iter()
        .filter_map(|c| extract_data_from_text(&c.text, c.bbox))
        .collect();

    PageRecord {
        page_number: geometry.page_number,
        text: geometry.text(),
        page_type: Some(page_type),
        error: None,
        data_blocks: associate_descriptions(data_blocks, &candidates, config),
    }
}

/// Extracts page records and metadata from PDF files
pub struct ReportExtractor {
    config: ExtractionConfig,
}

impl ReportExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract a PDF from disk, failing fast if it cannot be opened
    pub fn extract_file(&self, path: &Path) -> Result<ExtractionReport, ExtractError> {
        if !path.is_file() {
            return Err(ExtractError::FileNotFound(path.to_path_buf()));
        }

        let doc = Document::load(path).map_err(|e| ExtractError::Load(e.to_string()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(self.extract_document(&filename, &doc))
    }

    /// Extract a PDF held in memory
    pub fn extract_mem(&self, filename: &str, data: &[u8]) -> Result<ExtractionReport, ExtractError> {
        let doc = Document::load_mem(data).map_err(|e| ExtractError::Load(e.to_string()))?;
        Ok(self.extract_document(filename, &doc))
    }

    /// Extract every page of a parsed document
    pub fn extract_document(&self, filename: &str, doc: &Document) -> ExtractionReport {
        if doc.is_encrypted() {
            warn!("{} is encrypted, text extraction may fail", filename);
        }

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let metadata = read_metadata(doc, filename, page_numbers.len() as u32);

        info!(
            "Extracting {} ({} pages, title: {:?})",
            filename, metadata.pages, metadata.title
        );

        let mut report = ExtractionReport::new(metadata);

        for page_number in page_numbers {
            let record = match page_geometry(doc, page_number) {
                Ok(geometry) => {
                    let record = analyze_page(&geometry, &self.config);
                    debug!(
                        "Page {}: {} layout, {} data blocks",
                        page_number,
                        record.page_type.map_or("unknown", |t| t.as_str()),
                        record.data_blocks.len()
                    );
                    record
                }
                Err(e) => {
                    warn!("Error processing page {}: {}", page_number, e);
                    PageRecord::failed(page_number, e.to_string())
                }
            };
            report.pages.push(record);
        }

        info!(
            "Finished {} pages, found {} data items",
            report.pages.len(),
            report.data_count()
        );

        report
    }
}

impl Default for ReportExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

/// Collect the spans of one page and group them into blocks
///
/// pdf-extract panics on many malformed content streams (unknown font
/// resources, missing page boxes). Those panics are caught and reported as
/// a page error like any other.
pub fn page_geometry(doc: &Document, page_number: u32) -> Result<PageGeometry, ExtractError> {
    let page_error = |message: String| ExtractError::Page {
        page: page_number,
        message,
    };

    let mut collector = SpanCollector::new();
    panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::output_doc_page(doc, &mut collector, page_number)
    }))
    .map_err(|payload| page_error(panic_message(payload.as_ref())))?
    .map_err(|e| page_error(e.to_string()))?;

    let (spans, width, height) = collector.finish();
    Ok(PageGeometry::from_spans(page_number, width, height, spans))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "PDF content could not be processed".to_string()
    }
}

/// Filename, page count, title and author from the document info dictionary
pub fn read_metadata(doc: &Document, filename: &str, pages: u32) -> DocumentMetadata {
    DocumentMetadata {
        filename: filename.to_string(),
        pages,
        title: info_string(doc, b"Title"),
        author: info_string(doc, b"Author"),
    }
}

fn info_string(doc: &Document, key: &[u8]) -> String {
    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_object(*id).ok(),
        Ok(other) => Some(other),
        Err(_) => None,
    };

    info.and_then(|o| o.as_dict().ok())
        .and_then(|dict| dict.get(key).ok())
        .and_then(|value| value.as_str().ok())
        .map(decode_pdf_string)
        .unwrap_or_default()
}

/// Decode a PDF text string: UTF-16BE with BOM, then UTF-8, then Latin-1
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use susreport_types::{BBox, PageLayout, TextSpan};

    fn span(text: &str, bbox: [f64; 4]) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            bbox: bbox.into(),
            font_size: bbox[3] - bbox[1],
        }
    }

    #[test]
    fn test_empty_page_is_normal_text_without_data() {
        let geometry = PageGeometry::from_spans(4, 595.0, 842.0, vec![]);
        let record = analyze_page(&geometry, &ExtractionConfig::default());
        assert_eq!(record.page_number, 4);
        assert_eq!(record.page_type, Some(PageLayout::NormalText));
        assert!(record.data_blocks.is_empty());
        assert!(record.error.is_none());
        assert_eq!(record.text, "");
    }

    #[test]
    fn test_kpi_tile_takes_label_from_block_below() {
        let geometry = PageGeometry::from_spans(
            1,
            595.0,
            842.0,
            vec![
                span("45%", [0.0, 100.0, 50.0, 110.0]),
                span("再生能源使用比例", [0.0, 120.0, 60.0, 130.0]),
                span("附註說明", [0.0, 200.0, 60.0, 210.0]),
            ],
        );
        let record = analyze_page(&geometry, &ExtractionConfig::default());

        assert_eq!(record.data_blocks.len(), 1);
        let block = &record.data_blocks[0];
        assert_eq!(block.value, "45");
        assert_eq!(block.unit, "%");
        assert_eq!(block.bbox, BBox::new(0.0, 100.0, 50.0, 110.0));
        assert_eq!(block.description, "再生能源使用比例");
    }

    #[test]
    fn test_decode_utf16_title() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "永續報告書".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_pdf_string(&bytes), "永續報告書");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        assert_eq!(decode_pdf_string(&[0x43, 0x61, 0x66, 0xE9]), "Café");
        assert_eq!(decode_pdf_string(b"ESG Report"), "ESG Report");
    }

    #[test]
    fn test_panic_message_from_payload() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("no font F9"));
        assert_eq!(panic_message(owned.as_ref()), "no font F9");
        let literal: Box<dyn Any + Send> = Box::new("MediaBox");
        assert_eq!(panic_message(literal.as_ref()), "MediaBox");
    }

    #[test]
    fn test_missing_file_fails_fast() {
        let extractor = ReportExtractor::default();
        let err = extractor
            .extract_file(Path::new("/definitely/not/here.pdf"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }
}
