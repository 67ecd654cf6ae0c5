//! Token types for text analysis.
//!
//! A [`Token`] is the unit that flows through the analysis pipeline. Its
//! `position` is the ordinal of the word in the source text and is kept
//! unchanged by filters, so removing a stop word leaves a gap rather than
//! shifting later tokens. Phrase matching relies on this.
//!
//! # Examples
//!
//! ```
//! use lectern::analysis::token::Token;
//!
//! let token = Token::with_offsets("world", 1, 6, 11);
//! assert_eq!(token.text, "world");
//! assert_eq!(token.position, 1);
//! assert_eq!(token.start_offset, 6);
//! ```

use serde::{Deserialize, Serialize};

/// A single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The token's text content.
    pub text: String,

    /// Word ordinal in the source text (0-based).
    pub position: u32,

    /// Byte offset where this token starts in the original text.
    pub start_offset: usize,

    /// Byte offset where this token ends in the original text.
    pub end_offset: usize,
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: u32) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset: 0,
            end_offset: 0,
        }
    }

    /// Create a new token with text, position, and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: u32,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }

    /// Length of the token text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Clone this token with updated text.
    pub fn with_text<S: Into<String>>(&self, text: S) -> Self {
        let mut token = self.clone();
        token.text = text.into();
        token
    }
}

/// A boxed stream of tokens.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_char_len() {
        let token = Token::new("résumé", 0);
        assert_eq!(token.char_len(), 6);
        assert!(token.text.len() > 6);
    }

    #[test]
    fn test_with_text_keeps_position() {
        let token = Token::with_offsets("Hello", 3, 10, 15).with_text("hello");
        assert_eq!(token.text, "hello");
        assert_eq!(token.position, 3);
        assert_eq!(token.end_offset, 15);
    }
}
