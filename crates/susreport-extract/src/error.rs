use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("Failed to extract page {page}: {message}")]
    Page { page: u32, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
