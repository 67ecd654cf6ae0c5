//! Document table: caller identifiers to internal document ids.
//!
//! Ids are handed out in first-seen order and never reused. Removing a
//! document only sets its tombstone bit; re-adding the same identifier
//! revives the existing id.
//!
//! Per-document records live in [`DocumentEntries`], split into fixed-size
//! segments behind `Arc`s. Publishing a reader clones the segment list
//! only; a later write copies just the segment it touches.

use std::sync::Arc;

use ahash::AHashMap;
use bit_vec::BitVec;

use crate::index::posting::DocId;

/// Documents per shared segment.
pub const SEGMENT_SIZE: usize = 1024;

/// Per-document record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    /// The caller-supplied identifier (URL or similar).
    pub identifier: String,
    /// Number of indexed term occurrences, used for length normalization.
    pub term_count: u32,
}

#[derive(Debug, Clone, Default)]
struct DocumentSegment {
    entries: Vec<DocumentEntry>,
    tombstones: BitVec,
}

fn locate(doc_id: DocId) -> (usize, usize) {
    let index = doc_id as usize;
    (index / SEGMENT_SIZE, index % SEGMENT_SIZE)
}

/// Per-document records and tombstones, in id order. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct DocumentEntries {
    segments: Vec<Arc<DocumentSegment>>,
    len: usize,
    live_count: usize,
}

impl DocumentEntries {
    fn entry(&self, doc_id: DocId) -> Option<&DocumentEntry> {
        let (segment, offset) = locate(doc_id);
        self.segments.get(segment)?.entries.get(offset)
    }

    fn segment_mut(&mut self, doc_id: DocId) -> Option<(&mut DocumentSegment, usize)> {
        let (segment, offset) = locate(doc_id);
        if doc_id as usize >= self.len {
            return None;
        }
        let segment = Arc::make_mut(self.segments.get_mut(segment)?);
        Some((segment, offset))
    }

    fn push(&mut self, entry: DocumentEntry) -> DocId {
        let doc_id = self.len as DocId;
        if self.len % SEGMENT_SIZE == 0 {
            self.segments.push(Arc::new(DocumentSegment::default()));
        }
        if let Some(last) = self.segments.last_mut() {
            let segment = Arc::make_mut(last);
            segment.entries.push(entry);
            segment.tombstones.push(false);
        }
        self.len += 1;
        self.live_count += 1;
        doc_id
    }

    /// The identifier of a document, live or not.
    pub fn url_for(&self, doc_id: DocId) -> Option<&str> {
        self.entry(doc_id).map(|entry| entry.identifier.as_str())
    }

    /// Indexed term occurrences of a document (0 if unknown).
    pub fn term_count(&self, doc_id: DocId) -> u32 {
        self.entry(doc_id).map_or(0, |entry| entry.term_count)
    }

    /// Whether a document exists and is not tombstoned.
    pub fn is_live(&self, doc_id: DocId) -> bool {
        let (segment, offset) = locate(doc_id);
        self.segments
            .get(segment)
            .and_then(|segment| segment.tombstones.get(offset))
            == Some(false)
    }

    /// Ascending ids of all live documents.
    pub fn live_ids(&self) -> Vec<DocId> {
        let mut ids = Vec::with_capacity(self.live_count);
        for (number, segment) in self.segments.iter().enumerate() {
            let base = number * SEGMENT_SIZE;
            ids.extend(
                segment
                    .tombstones
                    .iter()
                    .enumerate()
                    .filter(|(_, dead)| !dead)
                    .map(|(offset, _)| (base + offset) as DocId),
            );
        }
        ids
    }

    /// Number of live documents.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Number of tombstoned documents.
    pub fn tombstoned_count(&self) -> usize {
        self.len - self.live_count
    }

    /// Total number of ids ever assigned.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no id has been assigned yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate `(doc_id, entry, live)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &DocumentEntry, bool)> {
        self.segments
            .iter()
            .flat_map(|segment| segment.entries.iter().zip(segment.tombstones.iter()))
            .enumerate()
            .map(|(doc_id, (entry, dead))| (doc_id as DocId, entry, !dead))
    }

    /// Number of segments `self` and `other` share without a copy.
    pub fn shared_segments(&self, other: &DocumentEntries) -> usize {
        self.segments
            .iter()
            .zip(&other.segments)
            .filter(|(a, b)| Arc::ptr_eq(a, b))
            .count()
    }
}

/// Maps identifiers to document ids and stores per-document statistics.
///
/// The identifier map is writer-side only; readers get [`DocumentEntries`].
#[derive(Debug, Default)]
pub struct DocumentTable {
    ids: AHashMap<String, DocId>,
    entries: DocumentEntries,
}

impl DocumentTable {
    /// Create an empty table.
    pub fn new() -> Self {
        DocumentTable::default()
    }

    /// Return the id for `identifier`, creating a new live entry on first
    /// sight. The flag reports whether the id is new.
    pub fn get_or_create_id(&mut self, identifier: &str) -> (DocId, bool) {
        if let Some(&doc_id) = self.ids.get(identifier) {
            return (doc_id, false);
        }

        let doc_id = self.entries.push(DocumentEntry {
            identifier: identifier.to_string(),
            term_count: 0,
        });
        self.ids.insert(identifier.to_string(), doc_id);
        (doc_id, true)
    }

    /// Look up the id of an identifier without creating it.
    pub fn id_for(&self, identifier: &str) -> Option<DocId> {
        self.ids.get(identifier).copied()
    }

    /// Record document-level statistics.
    pub fn record_stats(&mut self, doc_id: DocId, term_count: u32) {
        if let Some(entry) = self
            .entries
            .segment_mut(doc_id)
            .and_then(|(segment, offset)| segment.entries.get_mut(offset))
        {
            entry.term_count = term_count;
        }
    }

    /// Mark a document deleted. Returns whether it was live.
    pub fn tombstone(&mut self, doc_id: DocId) -> bool {
        if !self.entries.is_live(doc_id) {
            return false;
        }
        if let Some((segment, offset)) = self.entries.segment_mut(doc_id) {
            segment.tombstones.set(offset, true);
        }
        self.entries.live_count -= 1;
        true
    }

    /// Clear the tombstone of a re-added document. Returns whether it was dead.
    pub fn revive(&mut self, doc_id: DocId) -> bool {
        if doc_id as usize >= self.entries.len || self.entries.is_live(doc_id) {
            return false;
        }
        if let Some((segment, offset)) = self.entries.segment_mut(doc_id) {
            segment.tombstones.set(offset, false);
        }
        self.entries.live_count += 1;
        true
    }

    /// The per-document records, including unflushed changes.
    pub fn entries(&self) -> &DocumentEntries {
        &self.entries
    }

    /// Number of live documents.
    pub fn live_count(&self) -> usize {
        self.entries.live_count()
    }

    /// Number of tombstoned documents.
    pub fn tombstoned_count(&self) -> usize {
        self.entries.tombstoned_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_and_stable() {
        let mut table = DocumentTable::new();
        assert_eq!(table.get_or_create_id("mem://a"), (0, true));
        assert_eq!(table.get_or_create_id("mem://b"), (1, true));
        assert_eq!(table.get_or_create_id("mem://a"), (0, false));
        assert_eq!(table.entries().url_for(1), Some("mem://b"));
        assert_eq!(table.id_for("mem://c"), None);
    }

    #[test]
    fn test_tombstone_and_revive() {
        let mut table = DocumentTable::new();
        let (a, _) = table.get_or_create_id("mem://a");
        let (b, _) = table.get_or_create_id("mem://b");

        assert!(table.tombstone(a));
        assert!(!table.tombstone(a));
        assert_eq!(table.entries().live_ids(), vec![b]);
        assert_eq!(table.live_count(), 1);
        assert_eq!(table.tombstoned_count(), 1);

        // Re-adding an identifier revives its old id rather than allocating.
        let (again, created) = table.get_or_create_id("mem://a");
        assert_eq!((again, created), (a, false));
        assert!(table.revive(a));
        assert!(!table.revive(a));
        assert!(!table.revive(99));
        assert_eq!(table.entries().live_ids(), vec![a, b]);
    }

    #[test]
    fn test_record_stats() {
        let mut table = DocumentTable::new();
        let (id, _) = table.get_or_create_id("mem://a");
        table.record_stats(id, 42);
        assert_eq!(table.entries().term_count(id), 42);
        assert_eq!(table.entries().term_count(99), 0);
    }

    #[test]
    fn test_writes_copy_only_the_touched_segment() {
        let mut table = DocumentTable::new();
        for i in 0..3 * SEGMENT_SIZE {
            table.get_or_create_id(&format!("mem://{i}"));
        }
        let published = table.entries().clone();

        let (last, _) = table.get_or_create_id("mem://new");
        assert_eq!(last as usize, 3 * SEGMENT_SIZE);
        table.tombstone(SEGMENT_SIZE as DocId + 5);

        assert_eq!(table.entries().shared_segments(&published), 2);
        assert!(published.is_live(SEGMENT_SIZE as DocId + 5));
        assert!(!table.entries().is_live(SEGMENT_SIZE as DocId + 5));
        assert_eq!(published.len(), 3 * SEGMENT_SIZE);
        assert_eq!(table.entries().live_ids().len(), 3 * SEGMENT_SIZE);

        let ids: Vec<DocId> = table.entries().iter().map(|(id, _, _)| id).collect();
        assert_eq!(ids.len(), 3 * SEGMENT_SIZE + 1);
        assert!(ids.windows(2).all(|pair| pair[1] == pair[0] + 1));
    }
}
