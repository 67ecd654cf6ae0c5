//! The caller's handle on a running search.
//!
//! Evaluation runs on the search pool; batches are produced lazily on the
//! consumer side as the stream is read. A stream is consumed at most once
//! and cannot be restarted. Dropping it cancels the search.

use crossbeam_channel::{Receiver, bounded};
use log::debug;
use rayon::ThreadPool;

use crate::error::{LecternError, Result};
use crate::search::matches::{Match, SearchOutcome};
use crate::search::session::{CancellationToken, SearchSession, SessionState};

/// A lazy, finite sequence of matches in score-descending order.
///
/// Iterate it for single matches, or pull whole batches of at most `limit`
/// matches with [`SearchStream::next_batch`].
pub struct SearchStream {
    id: String,
    pending: Option<Receiver<SearchSession>>,
    session: Option<SearchSession>,
    token: CancellationToken,
    buffer: std::vec::IntoIter<Match>,
}

impl SearchStream {
    /// Start evaluating `session` on `pool`.
    pub fn spawn(pool: &ThreadPool, mut session: SearchSession) -> Self {
        let id = session.id().to_string();
        let token = session.cancellation_token();
        let (sender, receiver) = bounded(1);

        pool.spawn(move || {
            session.evaluate();
            // The receiver is gone if the stream was dropped.
            let _ = sender.send(session);
        });

        SearchStream {
            id,
            pending: Some(receiver),
            session: None,
            token,
            buffer: Vec::new().into_iter(),
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    fn session(&mut self) -> Result<&mut SearchSession> {
        if let Some(receiver) = self.pending.take() {
            let session = receiver.recv().map_err(|_| {
                LecternError::internal(format!("search {} evaluation did not complete", self.id))
            })?;
            self.session = Some(session);
        }
        self.session
            .as_mut()
            .ok_or_else(|| LecternError::internal("search stream has no session"))
    }

    /// Next batch of at most `limit` matches, blocking until evaluation is
    /// done. `None` once the search has ended.
    pub fn next_batch(&mut self) -> Result<Option<Vec<Match>>> {
        let mut batch: Vec<Match> = self.buffer.by_ref().collect();
        if batch.is_empty() {
            batch = self.session()?.next_batch()?;
        }
        Ok((!batch.is_empty()).then_some(batch))
    }

    /// Request cancellation. Batches already delivered stay valid.
    pub fn cancel(&self) {
        debug!("search {} cancellation requested", self.id);
        self.token.cancel();
    }

    /// A token that cancels this search from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Current state. A stream still waiting on evaluation reports
    /// `Evaluating`.
    pub fn state(&self) -> SessionState {
        match &self.session {
            Some(session) => session.state(),
            None => SessionState::Evaluating,
        }
    }

    /// Drain every remaining batch.
    pub fn collect_outcome(mut self) -> Result<SearchOutcome> {
        let mut matches = Vec::new();
        while let Some(batch) = self.next_batch()? {
            matches.extend(batch);
        }
        Ok(SearchOutcome {
            matches,
            state: self.state(),
        })
    }
}

impl Iterator for SearchStream {
    type Item = Result<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(next) = self.buffer.next() {
            return Some(Ok(next));
        }
        let batch = match self.session().and_then(|session| session.next_batch()) {
            Ok(batch) => batch,
            Err(e) => return Some(Err(e)),
        };
        self.buffer = batch.into_iter();
        self.buffer.next().map(Ok)
    }
}

impl Drop for SearchStream {
    fn drop(&mut self) {
        let finished = self
            .session
            .as_ref()
            .is_some_and(|session| session.state().is_terminal());
        if !finished {
            self.token.cancel();
        }
    }
}

impl std::fmt::Debug for SearchStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchStream")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
