//! End-to-end extraction over PDFs synthesised with lopdf

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use pretty_assertions::assert_eq;
use susreport_extract::output::format_full_text;
use susreport_extract::{ExtractError, ExtractionConfig, ReportExtractor, ReportWriter};
use susreport_types::PageLayout;

/// Text drawn at (x, y) in PDF user space, 12pt, with the named font
/// resource (only `F1` is defined)
struct Item<'a> {
    text: &'a str,
    x: i64,
    y: i64,
    font: &'a str,
}

fn at(text: &str, x: i64, y: i64) -> Item<'_> {
    Item { text, x, y, font: "F1" }
}

fn build_pdf(pages: &[Vec<Item>], title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids = Vec::new();
    for items in pages {
        let mut operations = Vec::new();
        for item in items {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(item.font.as_bytes().to_vec()), Object::Integer(12)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(item.x), Object::Integer(item.y)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(item.text.as_bytes().to_vec(), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages.len() as i64,
            "Kids" => kids,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Author" => Object::string_literal("Sustainability Office"),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn kpi_pdf() -> Vec<u8> {
    build_pdf(
        &[
            vec![
                at("45.6%", 72, 700),
                at("Renewable share", 72, 680),
                at("Water saved 1,200 %", 72, 500),
            ],
            vec![],
            vec![at("Closing remarks", 72, 700)],
        ],
        Some("ESG Report 2023"),
    )
}

#[test]
fn test_one_record_per_page() {
    let report = ReportExtractor::default()
        .extract_mem("esg.pdf", &kpi_pdf())
        .unwrap();

    assert_eq!(report.metadata.pages, 3);
    assert_eq!(report.pages.len() as u32, report.metadata.pages);
    let numbers: Vec<u32> = report.pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn test_metadata_from_info_dictionary() {
    let report = ReportExtractor::default()
        .extract_mem("esg.pdf", &kpi_pdf())
        .unwrap();

    assert_eq!(report.metadata.filename, "esg.pdf");
    assert_eq!(report.metadata.title, "ESG Report 2023");
    assert_eq!(report.metadata.author, "Sustainability Office");
}

#[test]
fn test_missing_info_dictionary_gives_empty_strings() {
    let pdf = build_pdf(&[vec![]], None);
    let report = ReportExtractor::default().extract_mem("plain.pdf", &pdf).unwrap();
    assert_eq!(report.metadata.title, "");
    assert_eq!(report.metadata.author, "");
}

#[test]
fn test_value_takes_description_from_label_below() {
    let report = ReportExtractor::default()
        .extract_mem("esg.pdf", &kpi_pdf())
        .unwrap();

    let page = &report.pages[0];
    assert!(page.text.contains("45.6%"));
    assert!(page.text.contains("Renewable share"));

    let kpi = page
        .data_blocks
        .iter()
        .find(|d| d.value == "45.6")
        .expect("45.6% should be detected");
    assert_eq!(kpi.unit, "%");
    assert_eq!(kpi.description, "Renewable share");

    let inline = page
        .data_blocks
        .iter()
        .find(|d| d.value == "1,200")
        .expect("1,200 % should be detected");
    assert_eq!(inline.description, "Water saved 1,200 %");
}

#[test]
fn test_empty_page_yields_normal_text_and_no_data() {
    let report = ReportExtractor::default()
        .extract_mem("esg.pdf", &kpi_pdf())
        .unwrap();

    let page = &report.pages[1];
    assert!(page.error.is_none());
    assert_eq!(page.page_type, Some(PageLayout::NormalText));
    assert!(page.data_blocks.is_empty());
}

#[test]
fn test_broken_page_becomes_placeholder_and_later_pages_extract() {
    let pdf = build_pdf(
        &[
            vec![Item {
                text: "Unreadable",
                x: 72,
                y: 700,
                font: "F9",
            }],
            vec![at("45.6%", 72, 700), at("Renewable share", 72, 680)],
        ],
        Some("ESG Report 2023"),
    );

    let report = ReportExtractor::default().extract_mem("broken.pdf", &pdf).unwrap();

    assert_eq!(report.pages.len() as u32, report.metadata.pages);
    assert_eq!(report.pages.len(), 2);

    let broken = &report.pages[0];
    assert!(broken.is_failed());
    assert_eq!(broken.text, "提取失敗");
    assert!(broken.error.is_some());
    assert!(broken.data_blocks.is_empty());

    let good = &report.pages[1];
    assert!(!good.is_failed());
    assert_eq!(good.data_blocks.len(), 1);
    assert_eq!(good.data_blocks[0].value, "45.6");
    assert_eq!(good.data_blocks[0].description, "Renewable share");
    assert_eq!(report.failed_pages().count(), 1);
}

#[test]
fn test_garbage_input_fails_to_load() {
    let err = ReportExtractor::default()
        .extract_mem("junk.pdf", b"not a pdf at all")
        .unwrap_err();
    assert!(matches!(err, ExtractError::Load(_)));
}

#[test]
fn test_extract_file_and_write_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_path = dir.path().join("report.pdf");
    std::fs::write(&pdf_path, kpi_pdf()).unwrap();
    let out = dir.path().join("out");

    let report = susreport_extract::extract_pdf_with_data(
        &pdf_path,
        Some(&out),
        &ExtractionConfig::default(),
        true,
    )
    .unwrap();

    assert_eq!(report.metadata.filename, "report.pdf");
    let full_text = std::fs::read_to_string(out.join("full_text.txt")).unwrap();
    assert_eq!(full_text, format_full_text(&report.pages));
    assert!(full_text.contains("===== 第 3 頁 ====="));

    let data = std::fs::read_to_string(out.join("page_1_data.txt")).unwrap();
    assert!(data.contains("數值: 45.6\n單位: %\n描述: Renewable share\n"));
    assert!(!out.join("page_2_data.txt").exists());
    assert!(out.join("extraction.json").exists());

    // writing again into the same directory overwrites cleanly
    ReportWriter::new(&out).write(&report).unwrap();
}
