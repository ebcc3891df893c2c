//! Exact nearest-neighbour index over squared Euclidean distance
//!
//! Vectors are stored row-major in one flat buffer. Search is a full scan,
//! which is plenty for the few thousand paragraphs of a single report.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::CorpusError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatL2Index {
    dimension: usize,
    count: usize,
    vectors: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            count: 0,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Stored vector at position `i`
    pub fn vector(&self, i: usize) -> Option<&[f32]> {
        (i < self.count).then(|| &self.vectors[i * self.dimension..(i + 1) * self.dimension])
    }

    /// Append vectors; positions continue from the current length.
    ///
    /// Nothing is added if any vector has the wrong dimension.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), CorpusError> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(CorpusError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        self.vectors.reserve(vectors.len() * self.dimension);
        for v in vectors {
            self.vectors.extend_from_slice(v);
        }
        self.count += vectors.len();
        Ok(())
    }

    /// The `k` nearest stored vectors as `(distances, positions)`, nearest
    /// first. Equal distances are ordered by position; `k` is clipped to the
    /// number of stored vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<(Vec<f32>, Vec<usize>), CorpusError> {
        if query.len() != self.dimension {
            return Err(CorpusError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(f32, usize)> = (0..self.count)
            .filter_map(|i| self.vector(i).map(|v| (squared_l2(query, v), i)))
            .collect();
        // stable sort keeps ascending positions among equal distances
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(k.min(self.count));

        Ok(scored.into_iter().unzip())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CorpusError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, CorpusError> {
        let index: Self = bincode::deserialize(data)?;
        let expected = index.count.checked_mul(index.dimension);
        if expected != Some(index.vectors.len()) {
            return Err(CorpusError::CorruptIndex(format!(
                "{} values for {} vectors of dimension {}",
                index.vectors.len(),
                index.count,
                index.dimension
            )));
        }
        Ok(index)
    }

    pub fn save(&self, path: &Path) -> Result<(), CorpusError> {
        fs::write(path, self.to_bytes()?)?;
        debug!("Saved {} vectors to {}", self.count, path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let index = Self::from_bytes(&fs::read(path)?)?;
        debug!("Loaded {} vectors from {}", index.count, path.display());
        Ok(index)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
