//! Paragraph store persisted as a JSON array of strings
//!
//! Position `i` in the store is the paragraph behind vector `i` in the
//! index; the two files are always written and read together.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::CorpusError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentStore {
    paragraphs: Vec<String>,
}

impl DocumentStore {
    pub fn new(paragraphs: Vec<String>) -> Self {
        Self { paragraphs }
    }

    pub fn get(&self, i: usize) -> Option<&str> {
        self.paragraphs.get(i).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paragraphs.iter().map(String::as_str)
    }

    pub fn save(&self, path: &Path) -> Result<(), CorpusError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_persisted_as_plain_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.json");
        let store = DocumentStore::new(vec!["溫室氣體".into(), "用水量".into()]);

        store.save(&path).unwrap();

        let raw: Vec<String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, vec!["溫室氣體", "用水量"]);
        assert_eq!(DocumentStore::load(&path).unwrap(), store);
    }

    #[test]
    fn test_non_ascii_is_written_unescaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.json");
        DocumentStore::new(vec!["永續".into()]).save(&path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("永續"));
    }
}
