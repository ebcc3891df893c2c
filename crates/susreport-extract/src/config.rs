//! Tunables for the extraction heuristics

use serde::{Deserialize, Serialize};

/// Largest vertical gap between a value and a description block below it
pub const DEFAULT_MAX_VERTICAL_GAP: f64 = 50.0;

/// Inline descriptions shorter than this are replaced by a nearby block
pub const DEFAULT_MIN_DESCRIPTION_CHARS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_max_vertical_gap")]
    pub max_vertical_gap: f64,
    #[serde(default = "default_min_description_chars")]
    pub min_description_chars: usize,
}

fn default_max_vertical_gap() -> f64 {
    DEFAULT_MAX_VERTICAL_GAP
}

fn default_min_description_chars() -> usize {
    DEFAULT_MIN_DESCRIPTION_CHARS
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_vertical_gap: DEFAULT_MAX_VERTICAL_GAP,
            min_description_chars: DEFAULT_MIN_DESCRIPTION_CHARS,
        }
    }
}
