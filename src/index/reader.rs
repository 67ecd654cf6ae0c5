//! Index reader: a consistent, immutable view of the index for searching.

use std::sync::Arc;

use log::warn;

use crate::index::document_table::DocumentEntries;
use crate::index::posting::{DocId, PostingList, TermVector};
use crate::index::store::{PostingSnapshot, WildcardKind};

/// A point-in-time view of the index as of one flush.
///
/// Readers are cheap to clone and never change: later writes and flushes
/// publish a new reader instead of touching this one, so a running search
/// sees exactly the state it started with.
#[derive(Debug, Clone, Default)]
pub struct IndexReader {
    documents: DocumentEntries,
    postings: Arc<PostingSnapshot>,
    live: Arc<Vec<DocId>>,
    generation: u64,
}

impl IndexReader {
    /// Assemble a reader from flushed state.
    pub fn new(documents: DocumentEntries, postings: Arc<PostingSnapshot>, generation: u64) -> Self {
        let live = Arc::new(documents.live_ids());
        IndexReader {
            documents,
            postings,
            live,
            generation,
        }
    }

    /// Postings for an exact, already normalized term.
    pub fn postings_for(&self, term: &str) -> Option<Arc<PostingList>> {
        self.postings.postings_for(term)
    }

    /// Expand a wildcard fragment to dictionary terms. At most `max_terms`
    /// terms are returned; a larger expansion is cut and logged.
    pub fn expand_wildcard(
        &self,
        fragment: &str,
        kind: WildcardKind,
        max_terms: usize,
    ) -> Vec<(String, Arc<PostingList>)> {
        let (terms, truncated) = self.postings.expand_wildcard(fragment, kind, max_terms);
        if truncated {
            warn!(
                "wildcard {kind:?} '{fragment}' matches more than {max_terms} terms; expansion truncated"
            );
        }
        terms
    }

    /// Identifier of a document.
    pub fn url_for(&self, doc_id: DocId) -> Option<&str> {
        self.documents.url_for(doc_id)
    }

    /// Whether a document was live when this reader was published.
    pub fn is_live(&self, doc_id: DocId) -> bool {
        self.documents.is_live(doc_id)
    }

    /// Indexed term occurrences of a document.
    pub fn document_length(&self, doc_id: DocId) -> u32 {
        self.documents.term_count(doc_id)
    }

    /// Forward index of a document.
    pub fn term_vector(&self, doc_id: DocId) -> Option<&Arc<TermVector>> {
        self.postings.term_vector(doc_id)
    }

    /// Ascending ids of live documents. This is the universe a search
    /// evaluates over.
    pub fn live_documents(&self) -> &[DocId] {
        &self.live
    }

    /// Number of live documents.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of tombstoned documents.
    pub fn tombstoned_count(&self) -> usize {
        self.documents.tombstoned_count()
    }

    /// Number of distinct terms in the dictionary.
    pub fn term_count(&self) -> usize {
        self.postings.term_count()
    }

    /// Flush generation this reader was published at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The per-document records behind this reader.
    pub fn documents(&self) -> &DocumentEntries {
        &self.documents
    }

    /// The posting state behind this reader.
    pub fn postings(&self) -> &PostingSnapshot {
        &self.postings
    }
}
