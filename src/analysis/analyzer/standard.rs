//! The standard analyzer used by the index by default.

use std::collections::HashSet;
use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::ascii_folding::AsciiFoldingFilter;
use crate::analysis::token_filter::length::MinLengthFilter;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::stop::{DEFAULT_ENGLISH_STOP_WORDS_SET, StopFilter};
use crate::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
use crate::engine::config::IndexConfig;
use crate::error::Result;

/// Default minimum number of characters for an indexable term.
pub const DEFAULT_MIN_TERM_LENGTH: usize = 3;

/// Unicode word tokenization, lowercasing, optional diacritic folding,
/// minimum-length and stop-word filtering.
pub struct StandardAnalyzer {
    inner: PipelineAnalyzer,
    fold_diacritics: bool,
}

impl StandardAnalyzer {
    /// Create a standard analyzer with default settings.
    pub fn new() -> Self {
        Self::with_settings(
            DEFAULT_MIN_TERM_LENGTH,
            DEFAULT_ENGLISH_STOP_WORDS_SET.clone(),
            true,
        )
    }

    /// Create a standard analyzer with explicit settings.
    pub fn with_settings(
        min_term_length: usize,
        stop_words: HashSet<String>,
        fold_diacritics: bool,
    ) -> Self {
        let mut analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
            .add_filter(Arc::new(LowercaseFilter::new()));
        if fold_diacritics {
            analyzer = analyzer.add_filter(Arc::new(AsciiFoldingFilter::new()));
        }
        let analyzer = analyzer
            .add_filter(Arc::new(MinLengthFilter::new(min_term_length)))
            .add_filter(Arc::new(StopFilter::with_stop_words(stop_words)));

        StandardAnalyzer {
            inner: analyzer,
            fold_diacritics,
        }
    }

    /// Create the analyzer an index with `config` uses for documents and
    /// queries.
    pub fn from_config(config: &IndexConfig) -> Self {
        Self::with_settings(
            config.min_term_length,
            config.stop_words.iter().cloned().collect(),
            config.fold_diacritics,
        )
    }

    /// Get the inner pipeline analyzer.
    pub fn inner(&self) -> &PipelineAnalyzer {
        &self.inner
    }
}

impl Default for StandardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn normalize_fragment(&self, fragment: &str) -> String {
        let lowered = fragment.to_lowercase();
        if self.fold_diacritics {
            AsciiFoldingFilter::fold(&lowered)
        } else {
            lowered
        }
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

impl std::fmt::Debug for StandardAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardAnalyzer")
            .field("inner", &self.inner)
            .field("fold_diacritics", &self.fold_diacritics)
            .finish()
    }
}
