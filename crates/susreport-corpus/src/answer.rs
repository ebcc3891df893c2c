//! Retrieval and answer formatting

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::config::{DEFAULT_ANSWER_MAX_CHARS, DEFAULT_TOP_K};
use crate::corpus::Corpus;
use crate::embeddings::TextEncoder;
use crate::error::CorpusError;

lazy_static! {
    static ref NEWLINE_RUNS: Regex = Regex::new(r"\n+").unwrap();
}

/// Collapse newline runs, trim, and cut to the first `max_chars` characters
pub fn format_answer(passage: &str, max_chars: usize) -> String {
    let collapsed = NEWLINE_RUNS.replace_all(passage, "\n");
    collapsed.trim().chars().take(max_chars).collect()
}

/// A retrieved paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<'a> {
    pub position: usize,
    pub distance: f32,
    pub text: &'a str,
}

/// Everything needed to answer questions, built once and then read-only
pub struct QaContext<E> {
    encoder: E,
    corpus: Corpus,
    top_k: usize,
    answer_max_chars: usize,
}

impl<E: TextEncoder> QaContext<E> {
    pub fn new(encoder: E, corpus: Corpus) -> Self {
        Self {
            encoder,
            corpus,
            top_k: DEFAULT_TOP_K,
            answer_max_chars: DEFAULT_ANSWER_MAX_CHARS,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_answer_max_chars(mut self, max_chars: usize) -> Self {
        self.answer_max_chars = max_chars;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The `top_k` paragraphs nearest to the question, nearest first
    pub fn retrieve(&self, question: &str) -> Result<Vec<Hit<'_>>, CorpusError> {
        if self.corpus.is_empty() {
            return Err(CorpusError::EmptyIndex);
        }

        let query = self
            .encoder
            .encode(&[question])?
            .pop()
            .ok_or_else(|| CorpusError::Model("encoder returned no vector".to_string()))?;

        let (distances, positions) = self.corpus.index().search(&query, self.top_k)?;

        Ok(positions
            .into_iter()
            .zip(distances)
            .filter_map(|(position, distance)| {
                self.corpus.documents().get(position).map(|text| Hit {
                    position,
                    distance,
                    text,
                })
            })
            .collect())
    }

    /// Answer from the single nearest paragraph
    pub fn answer(&self, question: &str) -> Result<String, CorpusError> {
        let hits = self.retrieve(question)?;
        let best = hits.first().ok_or(CorpusError::EmptyIndex)?;
        debug!(
            "Best match: paragraph {} at distance {:.4}",
            best.position, best.distance
        );
        Ok(format_answer(best.text, self.answer_max_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_newline_runs_collapse_and_trim() {
        assert_eq!(format_answer("\n\n用水量\n\n\n下降 5%\n", 300), "用水量\n下降 5%");
    }

    #[test]
    fn test_long_passage_is_cut_to_exactly_max_chars() {
        let passage = "碳".repeat(150) + "\n\n\n" + &"排".repeat(200);
        let answer = format_answer(&passage, 300);
        assert_eq!(answer.chars().count(), 300);
        assert!(!answer.contains("\n\n"));
        assert!(answer.starts_with(&"碳".repeat(150)));
    }

    #[test]
    fn test_short_passage_is_kept_whole() {
        assert_eq!(format_answer("減碳 12%", 300), "減碳 12%");
    }

    proptest! {
        #[test]
        fn answers_respect_the_cap(passage in "[a-z\n ]{0,400}", max in 0usize..350) {
            let answer = format_answer(&passage, max);
            prop_assert!(answer.chars().count() <= max);
            prop_assert!(!answer.contains("\n\n"));
        }
    }
}
