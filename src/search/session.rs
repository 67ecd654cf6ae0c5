//! One search, from evaluation to the last delivered batch.
//!
//! A session moves through
//! `Created -> Evaluating -> Streaming -> {Completed, Cancelled, TimedOut}`.
//! States only move forward and the terminal ones are final; a session is
//! evaluated at most once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};
use crate::index::reader::IndexReader;
use crate::query::eval::{ChunkContext, Scored};
use crate::query::plan::QueryPlan;
use crate::search::matches::Match;
use crate::search::scoring::Scorer;

/// Lifecycle of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Created,
    Evaluating,
    Streaming,
    Completed,
    Cancelled,
    TimedOut,
}

impl SessionState {
    /// Whether no more results will be produced.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::TimedOut
        )
    }
}

/// A cooperative cancellation request shared between a session and its
/// callers. Observed between evaluation chunks and between batches.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-session bounds.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Maximum matches per batch.
    pub limit: usize,
    /// Wall-clock budget for the whole session.
    pub time: Duration,
    /// Documents evaluated between two cancellation checks.
    pub chunk_size: usize,
}

/// State of a single search.
#[derive(Debug)]
pub struct SearchSession {
    id: String,
    reader: Arc<IndexReader>,
    plan: QueryPlan,
    scorer: Scorer,
    limits: SessionLimits,
    deadline: Option<Instant>,
    token: CancellationToken,
    state: SessionState,
    ranked: Vec<Scored>,
    cursor: usize,
    batches_delivered: usize,
    truncated: bool,
}

impl SearchSession {
    /// Create a session over `reader`. The time budget starts now.
    pub fn new(
        reader: Arc<IndexReader>,
        plan: QueryPlan,
        scorer: Scorer,
        limits: SessionLimits,
        token: CancellationToken,
    ) -> Self {
        SearchSession {
            id: uuid::Uuid::new_v4().to_string(),
            reader,
            plan,
            scorer,
            deadline: Instant::now().checked_add(limits.time),
            limits,
            token,
            state: SessionState::Created,
            ranked: Vec::new(),
            cursor: 0,
            batches_delivered: 0,
            truncated: false,
        }
    }

    /// Unique session id, used in logs.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether the time budget cut evaluation short.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Evaluate the query and rank the candidates. Does nothing unless the
    /// session is still `Created`.
    pub fn evaluate(&mut self) {
        if self.state != SessionState::Created {
            return;
        }
        self.state = SessionState::Evaluating;
        let started = Instant::now();

        let universe = self.reader.live_documents();
        let chunk_size = self.limits.chunk_size.max(1);
        let total_chunks = universe.len().div_ceil(chunk_size);
        let mut candidates: Vec<Scored> = Vec::new();

        for (index, chunk) in universe.chunks(chunk_size).enumerate() {
            if self.token.is_cancelled() {
                debug!("search {} cancelled during evaluation", self.id);
                self.state = SessionState::Cancelled;
                return;
            }

            candidates.extend(ChunkContext::new(&self.reader, self.scorer, chunk).evaluate(&self.plan));

            // Past the deadline, keep going until there is something to show.
            if index + 1 < total_chunks && !candidates.is_empty() && self.deadline_passed() {
                self.truncated = true;
                debug!(
                    "search {} ran out of time after {}/{} chunks",
                    self.id,
                    index + 1,
                    total_chunks
                );
                break;
            }
        }

        for (_, score) in candidates.iter_mut() {
            *score = self.scorer.finalize(*score);
        }
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        debug!(
            "search {} ranked {} candidates in {:?}",
            self.id,
            candidates.len(),
            started.elapsed()
        );
        self.ranked = candidates;
        self.state = SessionState::Streaming;
    }

    /// Produce the next batch of at most `limit` matches. An empty batch
    /// means the session has reached a terminal state.
    pub fn next_batch(&mut self) -> Result<Vec<Match>> {
        if self.state == SessionState::Created {
            self.evaluate();
        }
        if self.state != SessionState::Streaming {
            return Ok(Vec::new());
        }

        if self.token.is_cancelled() {
            self.finish(SessionState::Cancelled);
            return Ok(Vec::new());
        }
        if self.cursor >= self.ranked.len() {
            let terminal = if self.truncated {
                SessionState::TimedOut
            } else {
                SessionState::Completed
            };
            self.finish(terminal);
            return Ok(Vec::new());
        }
        // The first batch is always delivered so a tight budget still
        // yields a partial result.
        if self.batches_delivered > 0 && self.deadline_passed() {
            self.finish(SessionState::TimedOut);
            return Ok(Vec::new());
        }

        let end = (self.cursor + self.limits.limit.max(1)).min(self.ranked.len());
        let batch = self.ranked[self.cursor..end]
            .iter()
            .map(|&(doc_id, score)| {
                let identifier = self.reader.url_for(doc_id).ok_or_else(|| {
                    LecternError::internal(format!("ranked document {doc_id} has no identifier"))
                })?;
                Ok(Match::new(identifier, score))
            })
            .collect::<Result<Vec<_>>>()?;

        self.cursor = end;
        self.batches_delivered += 1;
        Ok(batch)
    }

    fn finish(&mut self, state: SessionState) {
        debug!(
            "search {} finished as {:?} after {} batches",
            self.id, state, self.batches_delivered
        );
        self.state = state;
        self.ranked = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::{StandardAnalyzer, term_occurrences};
    use crate::index::inverted::InvertedIndex;
    use crate::query::parser::QueryParser;
    use crate::query::plan::QueryCompiler;

    fn reader(docs: &[&str]) -> Arc<IndexReader> {
        let analyzer = StandardAnalyzer::new();
        let mut index = InvertedIndex::new();
        for (i, text) in docs.iter().enumerate() {
            index.upsert(
                &format!("mem://{i}"),
                term_occurrences(&analyzer, text).unwrap(),
            );
        }
        index.flush();
        index.reader()
    }

    fn session(reader: Arc<IndexReader>, query: &str, limit: usize, time: Duration) -> SearchSession {
        let analyzer = StandardAnalyzer::new();
        let tree = QueryParser::new().parse(query).unwrap();
        let plan = QueryCompiler::new(&reader, &analyzer, Scorer::relevance(), 100)
            .compile(&tree)
            .unwrap();
        SearchSession::new(
            reader,
            plan,
            Scorer::relevance(),
            SessionLimits {
                limit,
                time,
                chunk_size: 2,
            },
            CancellationToken::new(),
        )
    }

    #[test]
    fn test_batches_and_completion() {
        let reader = reader(&["apple", "apple apple", "apple pie", "pear", "apple tart"]);
        let mut session = session(reader, "apple", 2, Duration::from_secs(60));
        assert_eq!(session.state(), SessionState::Created);

        let first = session.next_batch().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].identifier, "mem://1");
        assert_eq!(session.state(), SessionState::Streaming);

        let second = session.next_batch().unwrap();
        assert_eq!(second.len(), 2);
        assert!(first[1].score >= second[0].score);

        assert!(session.next_batch().unwrap().is_empty());
        assert_eq!(session.state(), SessionState::Completed);
        assert!(session.next_batch().unwrap().is_empty());
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_ties_break_by_document_id() {
        let reader = reader(&["apple", "apple", "apple"]);
        let mut session = session(reader, "apple", 10, Duration::from_secs(60));
        let ids: Vec<String> = session
            .next_batch()
            .unwrap()
            .into_iter()
            .map(|m| m.identifier)
            .collect();
        assert_eq!(ids, vec!["mem://0", "mem://1", "mem://2"]);
    }

    #[test]
    fn test_cancel_before_evaluation() {
        let reader = reader(&["apple", "apple pie"]);
        let mut session = session(reader, "apple", 10, Duration::from_secs(60));
        session.cancellation_token().cancel();

        assert!(session.next_batch().unwrap().is_empty());
        assert_eq!(session.state(), SessionState::Cancelled);
    }

    #[test]
    fn test_cancel_between_batches() {
        let reader = reader(&["apple", "apple pie", "apple tart"]);
        let mut session = session(reader, "apple", 1, Duration::from_secs(60));

        assert_eq!(session.next_batch().unwrap().len(), 1);
        session.cancellation_token().cancel();
        assert!(session.next_batch().unwrap().is_empty());
        assert_eq!(session.state(), SessionState::Cancelled);
    }

    #[test]
    fn test_zero_budget_times_out_with_partial_result() {
        let docs: Vec<String> = (0..20).map(|i| format!("apple number{i}")).collect();
        let docs: Vec<&str> = docs.iter().map(String::as_str).collect();
        let mut session = session(reader(&docs), "apple", 3, Duration::ZERO);

        let first = session.next_batch().unwrap();
        assert!(!first.is_empty());
        assert!(first.len() <= 3);
        assert!(session.is_truncated());

        assert!(session.next_batch().unwrap().is_empty());
        assert_eq!(session.state(), SessionState::TimedOut);
    }

    #[test]
    fn test_zero_budget_scans_until_first_match() {
        let mut docs: Vec<String> = (0..40).map(|i| format!("filler number{i}")).collect();
        docs.push("needle".to_string());
        let docs: Vec<&str> = docs.iter().map(String::as_str).collect();
        let mut session = session(reader(&docs), "needle", 3, Duration::ZERO);

        let first = session.next_batch().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].identifier, "mem://40");
        assert!(!session.is_truncated());

        assert!(session.next_batch().unwrap().is_empty());
        assert_eq!(session.state(), SessionState::Completed);
    }
}
