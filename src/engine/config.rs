//! Configuration for a search index.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::standard::DEFAULT_MIN_TERM_LENGTH;
use crate::analysis::token_filter::stop::DEFAULT_ENGLISH_STOP_WORDS;
use crate::error::{LecternError, Result};
use crate::query::parser::{DEFAULT_MAX_QUERY_DEPTH, DEFAULT_MIN_SUBSTRING_LITERAL};

/// Index configuration.
///
/// Analysis settings (`min_term_length`, `stop_words`, `fold_diacritics`)
/// apply to documents and queries alike, so an index must be searched
/// with the settings it was built with.
///
/// # Example
///
/// ```
/// use lectern::engine::config::IndexConfig;
///
/// let config = IndexConfig::builder()
///     .min_term_length(2)
///     .search_threads(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.min_term_length, 2);
/// assert!(config.stop_words.iter().any(|w| w == "the"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Terms shorter than this many characters are never indexed.
    pub min_term_length: usize,
    /// Words that are never indexed.
    pub stop_words: Vec<String>,
    /// Strip diacritics so `café` and `cafe` are the same term.
    pub fold_diacritics: bool,
    /// Documents scored per cooperative evaluation step.
    pub evaluation_chunk_size: usize,
    /// Threads in the search pool.
    pub search_threads: usize,
    /// Maximum dictionary terms a single wildcard expands to.
    pub max_wildcard_expansions: usize,
    /// Minimum literal length of a `*x*` pattern.
    pub min_substring_literal: usize,
    /// How deep parenthesized groups may nest in a query.
    pub max_query_depth: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            min_term_length: DEFAULT_MIN_TERM_LENGTH,
            stop_words: DEFAULT_ENGLISH_STOP_WORDS
                .iter()
                .map(|w| w.to_string())
                .collect(),
            fold_diacritics: true,
            evaluation_chunk_size: 1024,
            search_threads: num_cpus::get(),
            max_wildcard_expansions: 4096,
            min_substring_literal: DEFAULT_MIN_SUBSTRING_LITERAL,
            max_query_depth: DEFAULT_MAX_QUERY_DEPTH,
        }
    }
}

impl IndexConfig {
    /// Create a new builder starting from the defaults.
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::new()
    }

    /// Load a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: IndexConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every size is usable.
    pub fn validate(&self) -> Result<()> {
        if self.min_term_length == 0 {
            return Err(LecternError::invalid_config("min_term_length must be at least 1"));
        }
        if self.evaluation_chunk_size == 0 {
            return Err(LecternError::invalid_config(
                "evaluation_chunk_size must be at least 1",
            ));
        }
        if self.search_threads == 0 {
            return Err(LecternError::invalid_config("search_threads must be at least 1"));
        }
        if self.max_wildcard_expansions == 0 {
            return Err(LecternError::invalid_config(
                "max_wildcard_expansions must be at least 1",
            ));
        }
        if self.min_substring_literal == 0 {
            return Err(LecternError::invalid_config(
                "min_substring_literal must be at least 1",
            ));
        }
        if self.max_query_depth == 0 {
            return Err(LecternError::invalid_config("max_query_depth must be at least 1"));
        }
        Ok(())
    }
}

/// Fluent builder for [`IndexConfig`].
#[derive(Debug, Clone, Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    pub fn new() -> Self {
        IndexConfigBuilder::default()
    }

    pub fn min_term_length(mut self, length: usize) -> Self {
        self.config.min_term_length = length;
        self
    }

    /// Replace the stop-word list.
    pub fn stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn fold_diacritics(mut self, fold: bool) -> Self {
        self.config.fold_diacritics = fold;
        self
    }

    pub fn evaluation_chunk_size(mut self, size: usize) -> Self {
        self.config.evaluation_chunk_size = size;
        self
    }

    pub fn search_threads(mut self, threads: usize) -> Self {
        self.config.search_threads = threads;
        self
    }

    pub fn max_wildcard_expansions(mut self, max: usize) -> Self {
        self.config.max_wildcard_expansions = max;
        self
    }

    pub fn min_substring_literal(mut self, min: usize) -> Self {
        self.config.min_substring_literal = min;
        self
    }

    pub fn max_query_depth(mut self, depth: usize) -> Self {
        self.config.max_query_depth = depth;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<IndexConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
