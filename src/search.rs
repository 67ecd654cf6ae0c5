//! Search sessions, scoring and result streaming.

pub mod matches;
pub mod options;
pub mod scoring;
pub mod session;
pub mod stream;

pub use matches::{Match, SearchOutcome};
pub use options::SearchOptions;
pub use scoring::{NEUTRAL_SCORE, Scorer};
pub use session::{CancellationToken, SearchSession, SessionLimits, SessionState};
pub use stream::SearchStream;
