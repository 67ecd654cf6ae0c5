//! Minimum term length filter.

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Drops tokens shorter than a minimum number of characters.
///
/// # Examples
///
/// ```
/// use lectern::analysis::token::Token;
/// use lectern::analysis::token_filter::Filter;
/// use lectern::analysis::token_filter::length::MinLengthFilter;
///
/// let filter = MinLengthFilter::new(3);
/// let tokens = vec![Token::new("go", 0), Token::new("rust", 1)];
/// let result: Vec<_> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();
/// assert_eq!(result.len(), 1);
/// assert_eq!(result[0].text, "rust");
/// ```
#[derive(Clone, Debug)]
pub struct MinLengthFilter {
    min_length: usize,
}

impl MinLengthFilter {
    /// Create a filter keeping tokens of at least `min_length` characters.
    pub fn new(min_length: usize) -> Self {
        MinLengthFilter { min_length }
    }

    /// The configured minimum length.
    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

impl Filter for MinLengthFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let min_length = self.min_length;
        let filtered_tokens: Vec<Token> = tokens
            .filter(|token| token.char_len() >= min_length)
            .collect();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "min_length"
    }
}
