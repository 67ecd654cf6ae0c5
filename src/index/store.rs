//! The posting store: term dictionary, posting lists and buffered writes.
//!
//! Writes are buffered as whole-document mutations and only become visible
//! on [`PostingStore::flush`]. The flushed state is an immutable
//! [`PostingSnapshot`] behind an `Arc`; flush applies the buffer to a
//! copy-on-write clone and publishes it in one step, so a reader holding
//! the previous snapshot never observes a partially applied document.
//!
//! The clone is shallow: posting lists and term vectors are shared, the
//! dictionary keys are `Arc<str>`, and term vectors sit in doc-id
//! segments so only the segments a flush touches are copied.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::debug;

use crate::index::document_table::SEGMENT_SIZE;
use crate::index::posting::{DocId, Posting, PostingList, TermVector};

/// A buffered, not yet searchable mutation.
#[derive(Debug, Clone)]
enum PendingMutation {
    Upsert { doc_id: DocId, terms: TermVector },
    Remove { doc_id: DocId },
}

/// How a wildcard pattern is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `abc*`
    Prefix,
    /// `*abc`
    Suffix,
    /// `*abc*`
    Substring,
}

type VectorSegment = Vec<Option<Arc<TermVector>>>;

/// Forward index by document id, in shared segments of [`SEGMENT_SIZE`].
#[derive(Debug, Clone, Default)]
struct TermVectors {
    segments: Vec<Arc<VectorSegment>>,
}

impl TermVectors {
    fn get(&self, doc_id: DocId) -> Option<&Arc<TermVector>> {
        let index = doc_id as usize;
        self.segments
            .get(index / SEGMENT_SIZE)?
            .get(index % SEGMENT_SIZE)?
            .as_ref()
    }

    fn insert(&mut self, doc_id: DocId, vector: Arc<TermVector>) {
        let index = doc_id as usize;
        let number = index / SEGMENT_SIZE;
        while self.segments.len() <= number {
            self.segments.push(Arc::new(vec![None; SEGMENT_SIZE]));
        }
        let segment = Arc::make_mut(&mut self.segments[number]);
        segment[index % SEGMENT_SIZE] = Some(vector);
    }

    fn remove(&mut self, doc_id: DocId) -> Option<Arc<TermVector>> {
        let index = doc_id as usize;
        let segment = self.segments.get_mut(index / SEGMENT_SIZE)?;
        segment.get(index % SEGMENT_SIZE)?.as_ref()?;
        Arc::make_mut(segment)[index % SEGMENT_SIZE].take()
    }

    fn shared_segments(&self, other: &TermVectors) -> usize {
        self.segments
            .iter()
            .zip(&other.segments)
            .filter(|(a, b)| Arc::ptr_eq(a, b))
            .count()
    }
}

/// Immutable, searchable state of the posting store.
#[derive(Debug, Clone, Default)]
pub struct PostingSnapshot {
    terms: BTreeMap<Arc<str>, Arc<PostingList>>,
    reversed_terms: BTreeSet<Arc<str>>,
    term_vectors: TermVectors,
}

impl PostingSnapshot {
    /// Postings for an exact term.
    pub fn postings_for(&self, term: &str) -> Option<Arc<PostingList>> {
        self.terms.get(term).cloned()
    }

    /// Forward index of one document.
    pub fn term_vector(&self, doc_id: DocId) -> Option<&Arc<TermVector>> {
        self.term_vectors.get(doc_id)
    }

    /// Number of term-vector segments `self` and `other` share without a copy.
    pub fn shared_vector_segments(&self, other: &PostingSnapshot) -> usize {
        self.term_vectors.shared_segments(&other.term_vectors)
    }

    /// Number of distinct terms in the dictionary.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Dictionary terms matching a wildcard fragment, in term order, at most
    /// `max_terms` of them. The flag reports whether the expansion was cut.
    pub fn expand_wildcard(
        &self,
        fragment: &str,
        kind: WildcardKind,
        max_terms: usize,
    ) -> (Vec<(String, Arc<PostingList>)>, bool) {
        let mut matched: Vec<String> = match kind {
            WildcardKind::Prefix => self
                .terms
                .range::<str, _>((
                    std::ops::Bound::Included(fragment),
                    std::ops::Bound::Unbounded,
                ))
                .map(|(term, _)| term)
                .take_while(|term| term.starts_with(fragment))
                .take(max_terms + 1)
                .map(|term| term.to_string())
                .collect(),
            WildcardKind::Suffix => {
                let reversed: String = fragment.chars().rev().collect();
                let mut terms: Vec<String> = self
                    .reversed_terms
                    .range::<str, _>((
                        std::ops::Bound::Included(reversed.as_str()),
                        std::ops::Bound::Unbounded,
                    ))
                    .take_while(|term| term.starts_with(reversed.as_str()))
                    .take(max_terms + 1)
                    .map(|term| term.chars().rev().collect())
                    .collect();
                terms.sort_unstable();
                terms
            }
            WildcardKind::Substring => self
                .terms
                .keys()
                .filter(|term| term.contains(fragment))
                .take(max_terms + 1)
                .map(|term| term.to_string())
                .collect(),
        };

        let truncated = matched.len() > max_terms;
        matched.truncate(max_terms);

        let expanded = matched
            .into_iter()
            .filter_map(|term| {
                let postings = self.terms.get(term.as_str())?.clone();
                Some((term, postings))
            })
            .collect();
        (expanded, truncated)
    }

    /// Iterate every `(term, posting list)` in term order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<PostingList>)> {
        self.terms.iter().map(|(term, list)| (&**term, list))
    }

    fn remove_document(&mut self, doc_id: DocId) {
        let Some(old) = self.term_vectors.remove(doc_id) else {
            return;
        };
        for (term, _) in old.iter() {
            let now_empty = match self.terms.get_mut(term) {
                Some(list) => {
                    Arc::make_mut(list).remove(doc_id);
                    list.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.terms.remove(term);
                self.reversed_terms.remove(reverse(term).as_str());
            }
        }
    }

    fn insert_document(&mut self, doc_id: DocId, vector: TermVector) {
        for (term, positions) in vector.iter() {
            let posting = Posting::with_positions(doc_id, positions.to_vec());
            match self.terms.get_mut(term) {
                Some(list) => Arc::make_mut(list).upsert(posting),
                None => {
                    let mut list = PostingList::default();
                    list.upsert(posting);
                    self.terms.insert(Arc::from(term), Arc::new(list));
                    self.reversed_terms.insert(Arc::from(reverse(term)));
                }
            }
        }
        self.term_vectors.insert(doc_id, Arc::new(vector));
    }
}

fn reverse(term: &str) -> String {
    term.chars().rev().collect()
}

/// The inverted index core. Owns all postings and every index mutation.
#[derive(Debug, Default)]
pub struct PostingStore {
    flushed: Arc<PostingSnapshot>,
    pending: Vec<PendingMutation>,
}

impl PostingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        PostingStore::default()
    }

    /// Replace all postings of `doc_id` with the given occurrences.
    /// Buffered until the next flush.
    pub fn upsert_document<I>(&mut self, doc_id: DocId, occurrences: I)
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let terms = TermVector::from_occurrences(occurrences);
        self.pending.push(PendingMutation::Upsert { doc_id, terms });
    }

    /// Drop all postings of `doc_id`. Buffered until the next flush.
    pub fn remove_document(&mut self, doc_id: DocId) {
        self.pending.push(PendingMutation::Remove { doc_id });
    }

    /// Whether buffered mutations are waiting for a flush.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of buffered mutations.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Merge buffered mutations into the searchable state. Returns whether
    /// anything changed; flushing a clean store is a no-op.
    pub fn flush(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }

        let applied = self.pending.len();
        let snapshot = Arc::make_mut(&mut self.flushed);
        for mutation in self.pending.drain(..) {
            match mutation {
                PendingMutation::Upsert { doc_id, terms } => {
                    snapshot.remove_document(doc_id);
                    snapshot.insert_document(doc_id, terms);
                }
                PendingMutation::Remove { doc_id } => snapshot.remove_document(doc_id),
            }
        }
        debug!(
            "flushed {applied} mutations, {} terms in dictionary",
            snapshot.term_count()
        );
        true
    }

    /// Postings for `term` as of the last flush.
    pub fn postings_for(&self, term: &str) -> Option<Arc<PostingList>> {
        self.flushed.postings_for(term)
    }

    /// The current flushed state.
    pub fn snapshot(&self) -> Arc<PostingSnapshot> {
        Arc::clone(&self.flushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occurrences(text: &str) -> Vec<(String, u32)> {
        text.split_whitespace()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i as u32))
            .collect()
    }

    #[test]
    fn test_writes_invisible_until_flush() {
        let mut store = PostingStore::new();
        store.upsert_document(0, occurrences("apple banana"));

        assert!(store.is_dirty());
        assert!(store.postings_for("apple").is_none());

        assert!(store.flush());
        assert!(!store.is_dirty());
        assert_eq!(store.postings_for("apple").unwrap().len(), 1);
    }

    #[test]
    fn test_flush_clean_store_is_noop() {
        let mut store = PostingStore::new();
        store.upsert_document(0, occurrences("apple"));
        store.flush();
        let before = store.snapshot();

        assert!(!store.flush());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_upsert_replaces_old_postings() {
        let mut store = PostingStore::new();
        store.upsert_document(0, occurrences("apple banana"));
        store.flush();
        store.upsert_document(0, occurrences("cherry"));
        store.flush();

        assert!(store.postings_for("apple").is_none());
        assert!(store.postings_for("banana").is_none());
        assert_eq!(store.postings_for("cherry").unwrap().len(), 1);
    }

    #[test]
    fn test_reader_keeps_its_snapshot() {
        let mut store = PostingStore::new();
        store.upsert_document(0, occurrences("apple"));
        store.flush();
        let reader = store.snapshot();

        store.upsert_document(1, occurrences("apple"));
        store.remove_document(0);
        store.flush();

        let old = reader.postings_for("apple").unwrap();
        assert_eq!(old.iter().map(|p| p.doc_id).collect::<Vec<_>>(), vec![0]);
        let new = store.postings_for("apple").unwrap();
        assert_eq!(new.iter().map(|p| p.doc_id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_flush_shares_untouched_segments() {
        let mut store = PostingStore::new();
        for doc_id in 0..2 * SEGMENT_SIZE as DocId {
            store.upsert_document(doc_id, occurrences("apple banana"));
        }
        store.upsert_document(2 * SEGMENT_SIZE as DocId, occurrences("durian"));
        store.flush();
        let before = store.snapshot();

        store.upsert_document(5, occurrences("cherry"));
        store.flush();
        let after = store.snapshot();

        // Only the first segment held a changed document.
        assert_eq!(after.shared_vector_segments(&before), 2);
        assert!(Arc::ptr_eq(
            &before.postings_for("durian").unwrap(),
            &after.postings_for("durian").unwrap()
        ));
        assert_eq!(after.postings_for("apple").unwrap().len(), 2 * SEGMENT_SIZE - 1);
        assert_eq!(before.postings_for("apple").unwrap().len(), 2 * SEGMENT_SIZE);
        assert_eq!(after.postings_for("cherry").unwrap().len(), 1);
        assert!(before.postings_for("cherry").is_none());
        assert!(after.term_vector(5).is_some());
        assert!(before.term_vector(5).is_some());
    }

    #[test]
    fn test_wildcard_expansion() {
        let mut store = PostingStore::new();
        store.upsert_document(0, occurrences("apple application banana running sing"));
        store.flush();
        let snapshot = store.snapshot();

        let terms = |fragment, kind| -> Vec<String> {
            let (expanded, _) = snapshot.expand_wildcard(fragment, kind, 100);
            expanded.into_iter().map(|(t, _)| t).collect()
        };

        assert_eq!(terms("appl", WildcardKind::Prefix), vec!["apple", "application"]);
        assert_eq!(terms("ing", WildcardKind::Suffix), vec!["running", "sing"]);
        assert_eq!(terms("nan", WildcardKind::Substring), vec!["banana"]);
        assert!(terms("zzz", WildcardKind::Prefix).is_empty());

        let (capped, truncated) = snapshot.expand_wildcard("a", WildcardKind::Substring, 2);
        assert_eq!(capped.len(), 2);
        assert!(truncated);
    }
}
