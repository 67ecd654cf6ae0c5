//! The inverted index: documents, postings, flushed readers and snapshots.

pub mod document_table;
pub mod inverted;
pub mod posting;
pub mod reader;
pub mod snapshot;
pub mod store;

pub use inverted::{IndexStats, InvertedIndex};
pub use posting::DocId;
pub use reader::IndexReader;
