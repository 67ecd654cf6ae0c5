//! Compiling query trees against a reader.
//!
//! Compilation normalizes every leaf through the same analyzer used at
//! index time, resolves terms to posting lists, expands wildcards and
//! precomputes idf. The resulting [`QueryPlan`] holds shared references
//! to immutable posting lists, so evaluating it never touches the writer.

use std::sync::Arc;

use crate::analysis::analyzer::{Analyzer, term_occurrences};
use crate::error::Result;
use crate::index::posting::PostingList;
use crate::index::reader::IndexReader;
use crate::query::ast::QueryNode;
use crate::search::scoring::Scorer;

/// One resolved dictionary term.
#[derive(Debug, Clone)]
pub struct TermLeaf {
    pub term: String,
    pub postings: Arc<PostingList>,
    pub idf: f32,
}

/// A phrase member and its position relative to the first member.
#[derive(Debug, Clone)]
pub struct PhraseLeg {
    pub leaf: TermLeaf,
    pub offset: u32,
}

/// A query term for similarity search and its frequency in the query.
#[derive(Debug, Clone)]
pub struct SimilarTerm {
    pub postings: Arc<PostingList>,
    pub frequency: u32,
}

/// An executable query.
#[derive(Debug, Clone)]
pub enum QueryPlan {
    /// Matches nothing.
    Empty,
    /// Union of term postings with additive scores. A plain term is a
    /// single leaf; a wildcard is its expansion.
    Terms(Vec<TermLeaf>),
    /// Contiguous, in-order occurrence of all legs.
    Phrase(Vec<PhraseLeg>),
    And(Vec<QueryPlan>),
    Or(Vec<QueryPlan>),
    /// Live documents not matched by the child.
    Not(Box<QueryPlan>),
    /// Cosine similarity against document term vectors.
    Similar {
        terms: Vec<SimilarTerm>,
        query_norm: f32,
    },
}

impl QueryPlan {
    /// Whether the plan can never match.
    pub fn is_empty(&self) -> bool {
        match self {
            QueryPlan::Empty => true,
            QueryPlan::Terms(leaves) => leaves.is_empty(),
            QueryPlan::Phrase(legs) => legs.is_empty(),
            QueryPlan::And(children) => children.iter().any(QueryPlan::is_empty),
            QueryPlan::Or(children) => children.iter().all(QueryPlan::is_empty),
            QueryPlan::Not(_) => false,
            QueryPlan::Similar { terms, .. } => terms.is_empty(),
        }
    }
}

/// Compiles query trees against one reader.
pub struct QueryCompiler<'a> {
    reader: &'a IndexReader,
    analyzer: &'a dyn Analyzer,
    scorer: Scorer,
    max_wildcard_expansions: usize,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(
        reader: &'a IndexReader,
        analyzer: &'a dyn Analyzer,
        scorer: Scorer,
        max_wildcard_expansions: usize,
    ) -> Self {
        QueryCompiler {
            reader,
            analyzer,
            scorer,
            max_wildcard_expansions,
        }
    }

    /// Compile a parsed tree.
    ///
    /// Words the analyzer drops (stop words, words below the minimum
    /// length) are never indexed, so they are left out of their enclosing
    /// expression. A tree made only of such words matches nothing.
    pub fn compile(&self, node: &QueryNode) -> Result<QueryPlan> {
        Ok(self.compile_node(node)?.unwrap_or(QueryPlan::Empty))
    }

    /// `None` when the node has no indexable text at all.
    fn compile_node(&self, node: &QueryNode) -> Result<Option<QueryPlan>> {
        let plan = match node {
            QueryNode::Term(word) => return self.compile_text(word),
            QueryNode::Phrase(words) => return self.compile_text(&words.join(" ")),
            QueryNode::Wildcard { pattern, kind } => {
                let fragment = self.analyzer.normalize_fragment(pattern);
                let leaves: Vec<TermLeaf> = self
                    .reader
                    .expand_wildcard(&fragment, *kind, self.max_wildcard_expansions)
                    .into_iter()
                    .map(|(term, postings)| self.leaf(term, postings))
                    .collect();
                if leaves.is_empty() {
                    QueryPlan::Empty
                } else {
                    QueryPlan::Terms(leaves)
                }
            }
            QueryNode::And(children) => match self.compile_children(children)? {
                Some(children) => QueryPlan::And(children),
                None => return Ok(None),
            },
            QueryNode::Or(children) => match self.compile_children(children)? {
                Some(children) => QueryPlan::Or(children),
                None => return Ok(None),
            },
            QueryNode::Not(child) => match self.compile_node(child)? {
                Some(child) => QueryPlan::Not(Box::new(child)),
                None => return Ok(None),
            },
        };
        Ok(Some(plan))
    }

    fn compile_children(&self, children: &[QueryNode]) -> Result<Option<Vec<QueryPlan>>> {
        let mut plans = Vec::with_capacity(children.len());
        for child in children {
            if let Some(plan) = self.compile_node(child)? {
                plans.push(plan);
            }
        }
        Ok((!plans.is_empty()).then_some(plans))
    }

    /// Compile raw text for similarity search. Operators are not
    /// interpreted; every character is plain text.
    pub fn compile_similar(&self, text: &str) -> Result<QueryPlan> {
        let mut frequencies: std::collections::BTreeMap<String, u32> =
            std::collections::BTreeMap::new();
        for (term, _) in term_occurrences(self.analyzer, text)? {
            *frequencies.entry(term).or_default() += 1;
        }

        let query_norm = frequencies
            .values()
            .map(|&tf| (tf as f32).powi(2))
            .sum::<f32>()
            .sqrt();
        let terms: Vec<SimilarTerm> = frequencies
            .into_iter()
            .filter_map(|(term, frequency)| {
                let postings = self.reader.postings_for(&term)?;
                Some(SimilarTerm {
                    postings,
                    frequency,
                })
            })
            .collect();

        if terms.is_empty() {
            return Ok(QueryPlan::Empty);
        }
        Ok(QueryPlan::Similar { terms, query_norm })
    }

    /// A word or phrase text. Text analyzing to several terms is matched as
    /// a phrase, keeping the position gaps left by removed stop words.
    fn compile_text(&self, text: &str) -> Result<Option<QueryPlan>> {
        let occurrences = term_occurrences(self.analyzer, text)?;
        let Some(first_position) = occurrences.first().map(|(_, position)| *position) else {
            return Ok(None);
        };

        let mut legs = Vec::with_capacity(occurrences.len());
        for (term, position) in occurrences {
            let Some(postings) = self.reader.postings_for(&term) else {
                return Ok(Some(QueryPlan::Empty));
            };
            legs.push(PhraseLeg {
                leaf: self.leaf(term, postings),
                offset: position - first_position,
            });
        }

        if legs.len() == 1 {
            let leg = legs.remove(0);
            return Ok(Some(QueryPlan::Terms(vec![leg.leaf])));
        }
        Ok(Some(QueryPlan::Phrase(legs)))
    }

    fn leaf(&self, term: String, postings: Arc<PostingList>) -> TermLeaf {
        let idf = self
            .scorer
            .idf(postings.doc_frequency(), self.reader.live_count());
        TermLeaf {
            term,
            postings,
            idf,
        }
    }
}
