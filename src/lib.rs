//! # Lectern
//!
//! An embeddable full-text search engine.
//!
//! ## Features
//!
//! - In-memory inverted index with positional postings
//! - Boolean (`AND`/`OR`/`NOT`), wildcard, phrase and similarity queries
//! - tf-idf relevance scoring with length normalization
//! - Separate indexing and search lanes; searches never see a torn update
//! - Result streaming in bounded batches with time budgets and cancellation
//! - Checksummed binary snapshots

pub mod analysis;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod query;
pub mod search;

pub mod prelude {
    pub use crate::document::ContentSource;
    pub use crate::engine::SearchIndex;
    pub use crate::engine::config::IndexConfig;
    pub use crate::engine::indexer::Indexer;
    pub use crate::error::{LecternError, Result};
    pub use crate::search::{Match, SearchOptions, SearchOutcome, SessionState};
}

pub use engine::SearchIndex;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
