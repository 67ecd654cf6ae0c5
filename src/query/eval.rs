//! Chunked query evaluation.
//!
//! The live-document universe is split into contiguous chunks of document
//! ids; each chunk is evaluated independently and yields `(doc_id, score)`
//! pairs sorted by id. Chunking bounds the work done between two
//! cancellation or deadline checks.

use crate::index::posting::{DocId, Posting};
use crate::index::reader::IndexReader;
use crate::query::plan::{PhraseLeg, QueryPlan, SimilarTerm, TermLeaf};
use crate::search::scoring::Scorer;

/// A scored candidate.
pub type Scored = (DocId, f32);

/// Evaluation inputs for one chunk of the universe.
pub struct ChunkContext<'a> {
    reader: &'a IndexReader,
    scorer: Scorer,
    /// Ascending live ids of this chunk.
    universe: &'a [DocId],
}

impl<'a> ChunkContext<'a> {
    pub fn new(reader: &'a IndexReader, scorer: Scorer, universe: &'a [DocId]) -> Self {
        ChunkContext {
            reader,
            scorer,
            universe,
        }
    }

    /// Evaluate `plan` over this chunk.
    pub fn evaluate(&self, plan: &QueryPlan) -> Vec<Scored> {
        let (Some(&lo), Some(&hi)) = (self.universe.first(), self.universe.last()) else {
            return Vec::new();
        };

        match plan {
            QueryPlan::Empty => Vec::new(),
            QueryPlan::Terms(leaves) => self.terms(leaves, lo, hi),
            QueryPlan::Phrase(legs) => self.phrase(legs, lo, hi),
            QueryPlan::And(children) => {
                let mut children = children.iter();
                let Some(first) = children.next() else {
                    return Vec::new();
                };
                let mut result = self.evaluate(first);
                for child in children {
                    if result.is_empty() {
                        break;
                    }
                    result = intersect(&result, &self.evaluate(child));
                }
                result
            }
            QueryPlan::Or(children) => children
                .iter()
                .map(|child| self.evaluate(child))
                .fold(Vec::new(), |acc, next| union(&acc, &next)),
            QueryPlan::Not(child) => {
                let excluded = self.evaluate(child);
                let mut excluded = excluded.iter().map(|(doc_id, _)| *doc_id).peekable();
                self.universe
                    .iter()
                    .filter(|&&doc_id| {
                        while excluded.next_if(|&e| e < doc_id).is_some() {}
                        excluded.peek() != Some(&doc_id)
                    })
                    .map(|&doc_id| (doc_id, 0.0))
                    .collect()
            }
            QueryPlan::Similar { terms, query_norm } => self.similar(terms, *query_norm, lo, hi),
        }
    }

    fn in_universe(&self, doc_id: DocId) -> bool {
        self.universe.binary_search(&doc_id).is_ok()
    }

    fn live_postings<'p>(
        &'p self,
        leaf: &'p TermLeaf,
        lo: DocId,
        hi: DocId,
    ) -> impl Iterator<Item = &'p Posting> + 'p {
        leaf.postings
            .range(lo, hi)
            .iter()
            .filter(move |posting| self.in_universe(posting.doc_id))
    }

    fn terms(&self, leaves: &[TermLeaf], lo: DocId, hi: DocId) -> Vec<Scored> {
        let mut scored: Vec<Scored> = Vec::new();
        for leaf in leaves {
            let leaf_scores: Vec<Scored> = self
                .live_postings(leaf, lo, hi)
                .map(|posting| {
                    let weight = self.scorer.term_weight(
                        posting.frequency(),
                        leaf.idf,
                        self.reader.document_length(posting.doc_id),
                    );
                    (posting.doc_id, weight)
                })
                .collect();
            scored = if scored.is_empty() {
                leaf_scores
            } else {
                union(&scored, &leaf_scores)
            };
        }
        scored
    }

    fn phrase(&self, legs: &[PhraseLeg], lo: DocId, hi: DocId) -> Vec<Scored> {
        let Some((first, rest)) = legs.split_first() else {
            return Vec::new();
        };
        let idf: f32 = legs.iter().map(|leg| leg.leaf.idf).sum();

        self.live_postings(&first.leaf, lo, hi)
            .filter_map(|anchor| {
                let others: Vec<(&Posting, u32)> = rest
                    .iter()
                    .map(|leg| Some((leg.leaf.postings.get(anchor.doc_id)?, leg.offset)))
                    .collect::<Option<_>>()?;

                let occurrences = anchor
                    .positions
                    .iter()
                    .filter(|&&start| {
                        others
                            .iter()
                            .all(|(posting, offset)| posting.has_position(start + offset))
                    })
                    .count() as u32;

                (occurrences > 0).then(|| {
                    let weight = self.scorer.term_weight(
                        occurrences,
                        idf,
                        self.reader.document_length(anchor.doc_id),
                    );
                    (anchor.doc_id, weight)
                })
            })
            .collect()
    }

    fn similar(&self, terms: &[SimilarTerm], query_norm: f32, lo: DocId, hi: DocId) -> Vec<Scored> {
        let mut dots: Vec<Scored> = Vec::new();
        for term in terms {
            let contributions: Vec<Scored> = term
                .postings
                .range(lo, hi)
                .iter()
                .filter(|posting| self.in_universe(posting.doc_id))
                .map(|posting| {
                    (
                        posting.doc_id,
                        term.frequency as f32 * posting.frequency() as f32,
                    )
                })
                .collect();
            dots = union(&dots, &contributions);
        }

        dots.into_iter()
            .map(|(doc_id, dot)| {
                let doc_norm = self
                    .reader
                    .term_vector(doc_id)
                    .map_or(0.0, |vector| vector.norm());
                (doc_id, self.scorer.cosine(dot, query_norm, doc_norm))
            })
            .collect()
    }
}

/// Documents in both lists, scores added.
pub fn intersect(left: &[Scored], right: &[Scored]) -> Vec<Scored> {
    let mut result = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].0.cmp(&right[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                result.push((left[i].0, left[i].1 + right[j].1));
                i += 1;
                j += 1;
            }
        }
    }
    result
}

/// Documents in either list, scores added.
pub fn union(left: &[Scored], right: &[Scored]) -> Vec<Scored> {
    let mut result = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].0.cmp(&right[j].0) {
            std::cmp::Ordering::Less => {
                result.push(left[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                result.push(right[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                result.push((left[i].0, left[i].1 + right[j].1));
                i += 1;
                j += 1;
            }
        }
    }
    result.extend_from_slice(&left[i..]);
    result.extend_from_slice(&right[j..]);
    result
}
