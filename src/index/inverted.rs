//! The writer side of the index.
//!
//! [`InvertedIndex`] owns the document table and the posting store and is
//! the only place documents are added or removed. It is not synchronized
//! itself; the engine keeps it behind a mutex so that flush and reader
//! publication happen as one step with respect to searches.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::index::document_table::DocumentTable;
use crate::index::posting::DocId;
use crate::index::reader::IndexReader;
use crate::index::store::PostingStore;

/// Statistics about an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Documents visible to searches after the next flush.
    pub live_documents: usize,
    /// Removed documents whose ids stay reserved.
    pub tombstoned_documents: usize,
    /// Distinct terms in the flushed dictionary.
    pub terms: usize,
    /// Buffered mutations not yet searchable.
    pub pending_mutations: usize,
}

/// Inverted index writer with a published, flushed reader.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    documents: DocumentTable,
    store: PostingStore,
    published: Arc<IndexReader>,
    generation: u64,
    dirty: bool,
}

impl InvertedIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        InvertedIndex::default()
    }

    /// Add or replace the document `identifier` with the given analyzed
    /// `(term, position)` occurrences. Becomes searchable on flush.
    pub fn upsert<I>(&mut self, identifier: &str, occurrences: I) -> DocId
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let occurrences: Vec<(String, u32)> = occurrences.into_iter().collect();
        let (doc_id, created) = self.documents.get_or_create_id(identifier);
        if !created {
            self.documents.revive(doc_id);
        }
        self.documents.record_stats(doc_id, occurrences.len() as u32);
        self.store.upsert_document(doc_id, occurrences);
        self.dirty = true;

        debug!("buffered document {doc_id} ({identifier}), new: {created}");
        doc_id
    }

    /// Remove the document `identifier`. Returns its id if it was live.
    pub fn remove(&mut self, identifier: &str) -> Option<DocId> {
        let doc_id = self.documents.id_for(identifier)?;
        if !self.documents.tombstone(doc_id) {
            return None;
        }
        self.store.remove_document(doc_id);
        self.dirty = true;

        debug!("buffered removal of document {doc_id} ({identifier})");
        Some(doc_id)
    }

    /// Make every buffered mutation searchable and publish a new reader.
    /// Returns whether anything changed.
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.store.flush();
        self.generation += 1;
        self.published = Arc::new(IndexReader::new(
            self.documents.entries().clone(),
            self.store.snapshot(),
            self.generation,
        ));
        self.dirty = false;

        debug!(
            "published generation {} with {} live documents",
            self.generation,
            self.published.live_count()
        );
        true
    }

    /// The reader published by the most recent flush.
    pub fn reader(&self) -> Arc<IndexReader> {
        Arc::clone(&self.published)
    }

    /// Whether there are unflushed mutations.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writer-side document table (includes unflushed changes).
    pub fn documents(&self) -> &DocumentTable {
        &self.documents
    }

    /// Current statistics.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            live_documents: self.documents.live_count(),
            tombstoned_documents: self.documents.tombstoned_count(),
            terms: self.published.term_count(),
            pending_mutations: self.store.pending_len(),
        }
    }
}
