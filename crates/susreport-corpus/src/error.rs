use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index is empty")]
    EmptyIndex,

    #[error("Index holds {vectors} vectors but the document store holds {documents} paragraphs")]
    Misaligned { vectors: usize, documents: usize },

    #[error("Corrupt index file: {0}")]
    CorruptIndex(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
