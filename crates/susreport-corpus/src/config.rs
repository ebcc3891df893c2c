//! Embedding model and answering settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL_REPO: &str = "shibing624/text2vec-base-chinese";
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_ANSWER_MAX_CHARS: usize = 300;

/// Where to find the sentence-embedding model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Hugging Face Hub repository, used when `local_dir` is unset
    #[serde(default = "default_repo_id")]
    pub repo_id: String,

    /// Directory holding `config.json`, `tokenizer.json` and
    /// `model.safetensors`
    #[serde(default)]
    pub local_dir: Option<PathBuf>,

    /// L2-normalise embeddings after pooling
    #[serde(default)]
    pub normalize: bool,
}

fn default_repo_id() -> String {
    DEFAULT_MODEL_REPO.to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            repo_id: default_repo_id(),
            local_dir: None,
            normalize: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_section_uses_defaults() {
        let config: ModelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ModelConfig::default());
        assert_eq!(config.repo_id, "shibing624/text2vec-base-chinese");
    }
}
