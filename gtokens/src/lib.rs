//! Token counting with tokenizer-backed counts and a length fallback.
//!
//! Counts are exact when the model maps to a known BPE encoding. For any
//! other model the count degrades to a character-length heuristic and the
//! result is flagged as estimated. Counting never fails.
//!
//! ```rust
//! use gtokens::count_text;
//!
//! let exact = count_text("hello world", "gpt-4o-mini");
//! assert!(!exact.estimated);
//!
//! let rough = count_text("hello world", "goftar-lab-1");
//! assert!(rough.estimated);
//! ```

use tiktoken_rs::get_bpe_from_model;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCount {
    pub tokens: u32,
    pub estimated: bool,
}

/// Counts the tokens in `text` for `model`.
///
/// Falls back to `ceil(chars / 4)` with `estimated = true` when the model
/// has no known encoding.
pub fn count_text(text: &str, model: &str) -> TokenCount {
    match get_bpe_from_model(model) {
        Ok(bpe) => TokenCount {
            tokens: bpe.encode_with_special_tokens(text).len() as u32,
            estimated: false,
        },
        Err(_) => TokenCount {
            tokens: heuristic_count(text),
            estimated: true,
        },
    }
}

/// Counts the tokens of a whole transcript.
///
/// Each `(role, content)` line is rendered as `role: content` and the lines
/// are joined with newlines before counting, so the prompt side of a chat
/// request is measured the same way regardless of how many segments it has.
pub fn count_transcript<'a, I>(lines: I, model: &str) -> TokenCount
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let joined = lines
        .into_iter()
        .map(|(role, content)| format!("{role}: {content}"))
        .collect::<Vec<_>>()
        .join("\n");

    count_text(&joined, model)
}

fn heuristic_count(text: &str) -> u32 {
    (text.chars().count() as u32).div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_counts_exactly() {
        let count = count_text("hello world", "gpt-4o-mini");
        assert!(!count.estimated);
        assert!(count.tokens > 0);
    }

    #[test]
    fn unknown_model_falls_back_to_length_heuristic() {
        let count = count_text("12345678", "goftar-lab-1");
        assert!(count.estimated);
        assert_eq!(count.tokens, 2);
    }

    #[test]
    fn heuristic_rounds_up_and_counts_characters_not_bytes() {
        assert_eq!(count_text("12345", "goftar-lab-1").tokens, 2);
        // Persian text is multi-byte per character.
        assert_eq!(count_text("سلام", "goftar-lab-1").tokens, 1);
    }

    #[test]
    fn empty_text_counts_zero() {
        assert_eq!(count_text("", "goftar-lab-1").tokens, 0);
        assert_eq!(count_text("", "gpt-4o-mini").tokens, 0);
    }

    #[test]
    fn transcript_joins_role_and_content_lines() {
        let lines = vec![("system", "You are terse"), ("user", "Hi")];
        let joined = count_transcript(lines, "goftar-lab-1");
        let direct = count_text("system: You are terse\nuser: Hi", "goftar-lab-1");
        assert_eq!(joined, direct);
    }

    #[test]
    fn empty_transcript_counts_zero() {
        let count = count_transcript(std::iter::empty(), "goftar-lab-1");
        assert_eq!(count.tokens, 0);
        assert!(count.estimated);
    }
}
