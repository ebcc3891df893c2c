//! `susreport.toml` configuration
//!
//! Every field is optional. Command-line flags override what the file sets.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use susreport_corpus::config::{DEFAULT_ANSWER_MAX_CHARS, DEFAULT_TOP_K};
use susreport_corpus::corpus::{DEFAULT_DOCUMENTS_FILE, DEFAULT_INDEX_FILE};
use susreport_corpus::ModelConfig;
use susreport_extract::ExtractionConfig;

/// Read from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "susreport.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Report to extract when the command line names none
    #[serde(default)]
    pub pdf_path: Option<PathBuf>,

    /// Directory for page text, data listings and `full_text.txt`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Paragraphs retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Answer length cap in characters
    #[serde(default = "default_answer_max_chars")]
    pub answer_max_chars: usize,

    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    #[serde(default = "default_documents_path")]
    pub documents_path: PathBuf,

    /// Also write `extraction.json`
    #[serde(default)]
    pub write_json: bool,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub model: ModelConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("extracted_pdf_content")
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_answer_max_chars() -> usize {
    DEFAULT_ANSWER_MAX_CHARS
}

fn default_index_path() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_FILE)
}

fn default_documents_path() -> PathBuf {
    PathBuf::from(DEFAULT_DOCUMENTS_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pdf_path: None,
            output_dir: default_output_dir(),
            top_k: default_top_k(),
            answer_max_chars: default_answer_max_chars(),
            index_path: default_index_path(),
            documents_path: default_documents_path(),
            write_json: false,
            extraction: ExtractionConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// The explicit file if given, else `susreport.toml` if present, else
    /// built-in defaults
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// `full_text.txt` inside the output directory
    pub fn full_text_path(&self) -> PathBuf {
        self.output_dir.join(susreport_extract::FULL_TEXT_FILE)
    }
}
