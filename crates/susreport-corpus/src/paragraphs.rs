//! Paragraph segmentation
//!
//! A paragraph is a chunk of the full text delimited by a blank line. It is
//! the unit that gets embedded, stored and returned as an answer.

pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split on `\n\n`, dropping chunks that contain only whitespace
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split(PARAGRAPH_SEPARATOR)
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_split_on_blank_lines() {
        let text = "第一段\n續行\n\n第二段\n\n\n\n第三段";
        assert_eq!(
            split_paragraphs(text),
            vec!["第一段\n續行", "第二段", "第三段"]
        );
    }

    #[test]
    fn test_whitespace_only_chunks_are_dropped() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs("\n\n  \n\n\t").is_empty());
    }

    #[test]
    fn test_page_headers_stay_with_their_text() {
        let text = "\n===== 第 1 頁 =====\n溫室氣體排放\n\n減碳目標\n";
        assert_eq!(
            split_paragraphs(text),
            vec!["\n===== 第 1 頁 =====\n溫室氣體排放", "減碳目標\n"]
        );
    }

    proptest! {
        #[test]
        fn paragraphs_never_contain_the_separator(text in "[a-c \n]{0,64}") {
            for paragraph in split_paragraphs(&text) {
                prop_assert!(!paragraph.contains(PARAGRAPH_SEPARATOR));
                prop_assert!(!paragraph.trim().is_empty());
            }
        }
    }
}
