//! Question answering over extracted report text
//!
//! The full text is cut into blank-line-delimited paragraphs, each
//! paragraph is embedded with a BERT sentence encoder, and the vectors go
//! into an exact L2 index persisted next to the paragraph list. Questions
//! are embedded the same way and answered with the nearest paragraph.

pub mod answer;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod paragraphs;
pub mod repl;
pub mod store;

pub use answer::{format_answer, Hit, QaContext};
pub use config::ModelConfig;
pub use corpus::Corpus;
pub use embeddings::{BertEncoder, TextEncoder};
pub use error::CorpusError;
pub use index::FlatL2Index;
pub use paragraphs::split_paragraphs;
pub use repl::run_repl;
pub use store::DocumentStore;
