//! Paragraph corpus: the vector index and the document store, kept aligned

use std::path::Path;
use tracing::info;

use crate::embeddings::TextEncoder;
use crate::error::CorpusError;
use crate::index::FlatL2Index;
use crate::paragraphs::split_paragraphs;
use crate::store::DocumentStore;

pub const DEFAULT_INDEX_FILE: &str = "vector_index.bin";
pub const DEFAULT_DOCUMENTS_FILE: &str = "documents.json";

/// Vector `i` of `index` embeds paragraph `i` of `documents`
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    index: FlatL2Index,
    documents: DocumentStore,
}

impl Corpus {
    /// Pair an index with its store, checking they have the same length
    pub fn new(index: FlatL2Index, documents: DocumentStore) -> Result<Self, CorpusError> {
        if index.len() != documents.len() {
            return Err(CorpusError::Misaligned {
                vectors: index.len(),
                documents: documents.len(),
            });
        }
        Ok(Self { index, documents })
    }

    /// Segment `full_text` into paragraphs and embed each one
    pub fn build<E: TextEncoder>(encoder: &E, full_text: &str) -> Result<Self, CorpusError> {
        let paragraphs = split_paragraphs(full_text);
        info!("Encoding {} paragraphs", paragraphs.len());

        let vectors = encoder.encode(&paragraphs)?;
        let mut index = FlatL2Index::new(encoder.dimension());
        index.add(&vectors)?;

        let documents = DocumentStore::new(paragraphs.into_iter().map(str::to_string).collect());
        Self::new(index, documents)
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn save(&self, index_path: &Path, documents_path: &Path) -> Result<(), CorpusError> {
        self.index.save(index_path)?;
        self.documents.save(documents_path)?;
        info!(
            "Saved {} paragraphs to {} and {}",
            self.len(),
            index_path.display(),
            documents_path.display()
        );
        Ok(())
    }

    pub fn load(index_path: &Path, documents_path: &Path) -> Result<Self, CorpusError> {
        let index = FlatL2Index::load(index_path)?;
        let documents = DocumentStore::load(documents_path)?;
        let corpus = Self::new(index, documents)?;
        info!("Loaded {} paragraphs", corpus.len());
        Ok(corpus)
    }
}
