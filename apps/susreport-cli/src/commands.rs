//! Subcommand implementations

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use susreport_corpus::{run_repl, BertEncoder, Corpus, QaContext};
use susreport_extract::output::write_page_dump;
use susreport_extract::{extract_pdf_with_data, ReportExtractor};

use crate::config::Config;

/// Extract a report into the output directory and print a summary
pub fn extract(config: &Config, pdf: Option<PathBuf>, output_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let pdf = pdf
        .or_else(|| config.pdf_path.clone())
        .context("No PDF given: pass a path or set pdf_path in the config file")?;
    let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());

    let report = extract_pdf_with_data(
        &pdf,
        Some(&output_dir),
        &config.extraction,
        json || config.write_json,
    )
    .with_context(|| {
        format!(
            "Failed to extract {} into {}",
            pdf.display(),
            output_dir.display()
        )
    })?;

    println!("已完成 {} 頁的處理", report.pages.len());
    println!("共找到 {} 個數據項", report.data_count());
    for page in report.failed_pages() {
        println!("第 {} 頁提取失敗: {}", page.page_number, page.error.as_deref().unwrap_or(""));
    }
    Ok(())
}

/// Dump page text to a single file
pub fn export_text(config: &Config, pdf: &Path, out: &Path) -> Result<()> {
    let report = ReportExtractor::new(config.extraction.clone())
        .extract_file(pdf)
        .with_context(|| format!("Failed to extract {}", pdf.display()))?;

    write_page_dump(&report, out).with_context(|| format!("Failed to write {}", out.display()))?;

    println!("已成功將內容輸出至: {}", out.display());
    Ok(())
}

/// Embed the paragraphs of a full-text file and persist the corpus
pub fn index(
    config: &Config,
    full_text: Option<PathBuf>,
    index_path: Option<PathBuf>,
    documents_path: Option<PathBuf>,
) -> Result<()> {
    let full_text = full_text.unwrap_or_else(|| config.full_text_path());
    let index_path = index_path.unwrap_or_else(|| config.index_path.clone());
    let documents_path = documents_path.unwrap_or_else(|| config.documents_path.clone());

    let content = fs::read_to_string(&full_text)
        .with_context(|| format!("Failed to read {}", full_text.display()))?;

    info!("Loading embedding model");
    let encoder = BertEncoder::from_config(&config.model).context("Failed to load embedding model")?;

    let corpus = Corpus::build(&encoder, &content).context("Failed to encode paragraphs")?;
    corpus
        .save(&index_path, &documents_path)
        .context("Failed to save vector index")?;

    println!("向量索引已建立並存檔！({} 個段落)", corpus.len());
    Ok(())
}

pub struct AskOptions {
    pub question: Option<String>,
    pub top_k: Option<usize>,
    pub max_chars: Option<usize>,
    pub index_path: Option<PathBuf>,
    pub documents_path: Option<PathBuf>,
}

/// Answer one question, or run the interactive loop on stdin
pub fn ask(config: &Config, options: AskOptions) -> Result<()> {
    let index_path = options.index_path.unwrap_or_else(|| config.index_path.clone());
    let documents_path = options
        .documents_path
        .unwrap_or_else(|| config.documents_path.clone());

    info!("Loading vector index from {}", index_path.display());
    let corpus = Corpus::load(&index_path, &documents_path).with_context(|| {
        format!(
            "Failed to load {} and {}; run `susreport index` first",
            index_path.display(),
            documents_path.display()
        )
    })?;

    let encoder = BertEncoder::from_config(&config.model).context("Failed to load embedding model")?;
    let context = QaContext::new(encoder, corpus)
        .with_top_k(options.top_k.unwrap_or(config.top_k))
        .with_answer_max_chars(options.max_chars.unwrap_or(config.answer_max_chars));

    match options.question {
        Some(question) => {
            println!("{}", context.answer(&question)?);
        }
        None => {
            run_repl(&context, io::stdin().lock(), io::stdout().lock())?;
        }
    }
    Ok(())
}
