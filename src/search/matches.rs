//! Search results.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::search::session::SessionState;

/// A matching document and its relevance score.
///
/// Two matches are equal when they name the same document, whatever their
/// scores, so matches from different searches can be deduplicated in a
/// `HashSet`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    /// The document identifier the document was indexed under.
    pub identifier: String,
    pub score: f32,
}

impl Match {
    pub fn new<S: Into<String>>(identifier: S, score: f32) -> Self {
        Match {
            identifier: identifier.into(),
            score,
        }
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Match {}

impl Hash for Match {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

/// Everything one search produced, and how it ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Matches in delivery order (score descending).
    pub matches: Vec<Match>,
    /// Terminal state of the session.
    pub state: SessionState,
}

impl SearchOutcome {
    /// Whether the time budget cut the search short.
    pub fn timed_out(&self) -> bool {
        self.state == SessionState::TimedOut
    }
}
