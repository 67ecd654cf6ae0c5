//! Diacritic folding filter.
//!
//! Decomposes each token to NFD and drops combining marks, so `café`,
//! `cafe` and `CAFÉ` (after lowercasing) index to the same term.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that strips diacritics from tokens.
///
/// # Examples
///
/// ```
/// use lectern::analysis::token::Token;
/// use lectern::analysis::token_filter::Filter;
/// use lectern::analysis::token_filter::ascii_folding::AsciiFoldingFilter;
///
/// let filter = AsciiFoldingFilter::new();
/// let tokens = vec![Token::new("résumé", 0)];
/// let result: Vec<_> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();
/// assert_eq!(result[0].text, "resume");
/// ```
#[derive(Clone, Debug, Default)]
pub struct AsciiFoldingFilter;

impl AsciiFoldingFilter {
    /// Create a new folding filter.
    pub fn new() -> Self {
        AsciiFoldingFilter
    }

    /// Fold a single string.
    pub fn fold(text: &str) -> String {
        if text.is_ascii() {
            return text.to_string();
        }
        text.nfd().filter(|c| !is_combining_mark(*c)).collect()
    }
}

impl Filter for AsciiFoldingFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens = tokens
            .map(|token| {
                if token.text.is_ascii() {
                    token
                } else {
                    let folded = Self::fold(&token.text);
                    token.with_text(folded)
                }
            })
            .collect::<Vec<_>>();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "ascii_folding"
    }
}
