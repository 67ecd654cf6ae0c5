//! Posting lists and per-document term vectors.
//!
//! A [`PostingList`] holds one [`Posting`] per document containing a term,
//! kept sorted by ascending document id with unique ids. A [`TermVector`] is
//! the forward view of one document (term -> positions); the store keeps it
//! so a re-added document's old postings can be found and removed, and so
//! similarity search can compare documents as vectors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Internal document identifier. Assigned monotonically, never reused.
pub type DocId = u64;

/// A single posting in a posting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document ID.
    pub doc_id: DocId,
    /// Ascending positions of the term in the document.
    pub positions: Vec<u32>,
}

impl Posting {
    /// Create a posting with positions. `positions` must be ascending.
    pub fn with_positions(doc_id: DocId, positions: Vec<u32>) -> Self {
        debug_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        Posting { doc_id, positions }
    }

    /// Get the term frequency.
    pub fn frequency(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Whether the term occurs at `position` in this document.
    pub fn has_position(&self, position: u32) -> bool {
        self.positions.binary_search(&position).is_ok()
    }
}

/// A posting list for a specific term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingList {
    postings: Vec<Posting>,
    total_frequency: u64,
}

impl PostingList {
    /// Create a new empty posting list.
    pub fn new() -> Self {
        PostingList::default()
    }

    /// Insert or replace the posting for `posting.doc_id`, keeping the list
    /// sorted. Appending a new highest id is the common case and costs O(1).
    pub fn upsert(&mut self, posting: Posting) {
        self.total_frequency += posting.frequency() as u64;

        if self
            .postings
            .last()
            .is_none_or(|last| last.doc_id < posting.doc_id)
        {
            self.postings.push(posting);
            return;
        }

        match self
            .postings
            .binary_search_by_key(&posting.doc_id, |p| p.doc_id)
        {
            Ok(pos) => {
                let old = std::mem::replace(&mut self.postings[pos], posting);
                self.total_frequency -= old.frequency() as u64;
            }
            Err(pos) => self.postings.insert(pos, posting),
        }
    }

    /// Remove the posting for `doc_id`. Returns whether one was present.
    pub fn remove(&mut self, doc_id: DocId) -> bool {
        match self.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(pos) => {
                let old = self.postings.remove(pos);
                self.total_frequency -= old.frequency() as u64;
                true
            }
            Err(_) => false,
        }
    }

    /// Look up the posting for one document.
    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|pos| &self.postings[pos])
    }

    /// Postings whose document id lies in `lo..=hi`.
    pub fn range(&self, lo: DocId, hi: DocId) -> &[Posting] {
        let start = self.postings.partition_point(|p| p.doc_id < lo);
        let end = self.postings.partition_point(|p| p.doc_id <= hi);
        &self.postings[start..end.max(start)]
    }

    /// Document frequency (number of documents containing this term).
    pub fn doc_frequency(&self) -> usize {
        self.postings.len()
    }

    /// Total occurrences across all documents.
    pub fn total_frequency(&self) -> u64 {
        self.total_frequency
    }

    /// Get the length of the posting list.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if the posting list is empty.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Get an iterator over the postings.
    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    /// Check the sorted-unique invariant.
    pub fn is_well_formed(&self) -> bool {
        self.postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id)
            && self.postings.iter().all(|p| !p.positions.is_empty())
    }
}

/// The forward index of one document: every term with its positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermVector {
    terms: BTreeMap<String, Vec<u32>>,
    norm: f32,
}

impl TermVector {
    /// Build a term vector from `(term, position)` occurrences in any order.
    pub fn from_occurrences<I>(occurrences: I) -> Self
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let mut terms: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for (term, position) in occurrences {
            terms.entry(term).or_default().push(position);
        }
        for positions in terms.values_mut() {
            positions.sort_unstable();
            positions.dedup();
        }

        let norm = terms
            .values()
            .map(|positions| (positions.len() as f32).powi(2))
            .sum::<f32>()
            .sqrt();

        TermVector { terms, norm }
    }

    /// Iterate `(term, positions)` in term order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.terms
            .iter()
            .map(|(term, positions)| (term.as_str(), positions.as_slice()))
    }

    /// Frequency of `term` in this document.
    pub fn frequency(&self, term: &str) -> u32 {
        self.terms.get(term).map_or(0, |p| p.len() as u32)
    }

    /// Euclidean norm of the raw term-frequency vector.
    pub fn norm(&self) -> f32 {
        self.norm
    }

    /// Total number of indexed term occurrences.
    pub fn total_terms(&self) -> u32 {
        self.terms.values().map(|p| p.len() as u32).sum()
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the document produced no indexable terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_keeps_order() {
        let mut list = PostingList::new();
        list.upsert(Posting::with_positions(5, vec![1]));
        list.upsert(Posting::with_positions(1, vec![0, 4]));
        list.upsert(Posting::with_positions(3, vec![2]));

        let ids: Vec<DocId> = list.iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert_eq!(list.total_frequency(), 4);
        assert!(list.is_well_formed());
    }

    #[test]
    fn test_upsert_replaces_existing_posting() {
        let mut list = PostingList::new();
        list.upsert(Posting::with_positions(2, vec![0, 1, 2]));
        list.upsert(Posting::with_positions(7, vec![0]));
        list.upsert(Posting::with_positions(2, vec![9]));

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(2).unwrap().positions, vec![9]);
        assert_eq!(list.total_frequency(), 2);
    }

    #[test]
    fn test_remove() {
        let mut list = PostingList::new();
        list.upsert(Posting::with_positions(1, vec![0]));
        list.upsert(Posting::with_positions(2, vec![3, 5]));

        assert!(list.remove(2));
        assert!(!list.remove(2));
        assert_eq!(list.doc_frequency(), 1);
        assert_eq!(list.total_frequency(), 1);
    }

    #[test]
    fn test_range() {
        let mut list = PostingList::new();
        for id in [2, 4, 6, 8] {
            list.upsert(Posting::with_positions(id, vec![0]));
        }

        let ids: Vec<DocId> = list.range(3, 6).iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![4, 6]);
        assert!(list.range(9, 20).is_empty());
        assert!(list.range(5, 3).is_empty());
    }

    #[test]
    fn test_term_vector() {
        let vector = TermVector::from_occurrences(vec![
            ("beta".to_string(), 3),
            ("alpha".to_string(), 0),
            ("beta".to_string(), 1),
        ]);

        let collected: Vec<(&str, &[u32])> = vector.iter().collect();
        assert_eq!(collected[0], ("alpha", &[0u32][..]));
        assert_eq!(collected[1], ("beta", &[1u32, 3][..]));
        assert_eq!(vector.frequency("beta"), 2);
        assert_eq!(vector.total_terms(), 3);
        assert!((vector.norm() - 5f32.sqrt()).abs() < 1e-6);
    }
}
