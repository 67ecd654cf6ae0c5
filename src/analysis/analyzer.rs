//! Analyzers combine a tokenizer and a filter chain.
//!
//! The [`Analyzer`] trait is the term-normalizer seam of the engine: the
//! indexing lane and the query compiler both go through
//! [`term_occurrences`], so documents and queries are normalized the same
//! way.

use crate::analysis::token::TokenStream;
use crate::error::Result;

pub mod pipeline;
pub mod standard;

pub use pipeline::PipelineAnalyzer;
pub use standard::StandardAnalyzer;

/// Trait for analyzers that turn raw text into normalized tokens.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Normalize a literal fragment of a wildcard pattern.
    ///
    /// Wildcard fragments are not whole words, so they skip stop-word and
    /// length filtering but must still receive the same case and diacritic
    /// treatment as indexed terms.
    fn normalize_fragment(&self, fragment: &str) -> String {
        fragment.to_string()
    }

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// Run `analyzer` over `text` and return `(term, position)` pairs in
/// source order.
///
/// # Examples
///
/// ```
/// use lectern::analysis::analyzer::{term_occurrences, StandardAnalyzer};
///
/// let analyzer = StandardAnalyzer::new();
/// let terms = term_occurrences(&analyzer, "The Quick fox jumps").unwrap();
/// assert_eq!(terms, vec![
///     ("quick".to_string(), 1),
///     ("fox".to_string(), 2),
///     ("jumps".to_string(), 3),
/// ]);
/// ```
pub fn term_occurrences(analyzer: &dyn Analyzer, text: &str) -> Result<Vec<(String, u32)>> {
    Ok(analyzer
        .analyze(text)?
        .map(|token| (token.text, token.position))
        .collect())
}
