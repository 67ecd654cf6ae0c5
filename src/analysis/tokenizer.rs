//! Tokenizer implementations for text analysis.
//!
//! - [`unicode_word::UnicodeWordTokenizer`] - Splits on Unicode word boundaries

use crate::analysis::token::TokenStream;
use crate::error::Result;

pub mod unicode_word;

pub use unicode_word::UnicodeWordTokenizer;

/// Trait for tokenizers that convert text into tokens.
///
/// Tokenizers must number the words they emit with consecutive positions
/// starting at zero.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}
