//! Error types for the Lectern library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`LecternError`] enum. Timeouts and cancellation of a search are not
//! errors: they are reported as terminal session states
//! (see [`crate::search::session::SessionState`]).
//!
//! # Examples
//!
//! ```
//! use lectern::error::{LecternError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(LecternError::invalid_argument("limit must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Lectern operations.
#[derive(Error, Debug)]
pub enum LecternError {
    /// I/O errors (reading a content source, snapshot files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A document could not be admitted to the index.
    #[error("Failed to index {identifier}: {reason}")]
    Indexing { identifier: String, reason: String },

    /// A query string is malformed. `position` is the zero-based character
    /// offset of the offending token.
    #[error("Query syntax error at position {position}: {message}")]
    QuerySyntax { position: usize, message: String },

    /// Analysis-related errors (tokenization, filtering).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// A caller supplied an argument outside the accepted domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Snapshot bytes are corrupt or were written by an incompatible version.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Binary serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The worker behind an execution lane has shut down.
    #[error("Lane closed: {0}")]
    LaneClosed(String),

    /// Broken internal invariant. Not recoverable.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for operations that may fail with LecternError.
pub type Result<T> = std::result::Result<T, LecternError>;

impl LecternError {
    /// Create a new indexing error for the given document identifier.
    pub fn indexing<I: Into<String>, R: Into<String>>(identifier: I, reason: R) -> Self {
        LecternError::Indexing {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Create a new query syntax error.
    pub fn query_syntax<S: Into<String>>(position: usize, message: S) -> Self {
        LecternError::QuerySyntax {
            position,
            message: message.into(),
        }
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        LecternError::Analysis(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LecternError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        LecternError::InvalidArgument(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new snapshot error.
    pub fn snapshot<S: Into<String>>(msg: S) -> Self {
        LecternError::Snapshot(msg.into())
    }

    /// Create a new lane-closed error.
    pub fn lane_closed<S: Into<String>>(lane: S) -> Self {
        LecternError::LaneClosed(lane.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        LecternError::Internal(msg.into())
    }

    /// Position of a query syntax error, if this is one.
    pub fn syntax_position(&self) -> Option<usize> {
        match self {
            LecternError::QuerySyntax { position, .. } => Some(*position),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = LecternError::indexing("file:///tmp/a.txt", "not valid UTF-8");
        assert_eq!(
            error.to_string(),
            "Failed to index file:///tmp/a.txt: not valid UTF-8"
        );

        let error = LecternError::query_syntax(4, "unbalanced parenthesis");
        assert_eq!(
            error.to_string(),
            "Query syntax error at position 4: unbalanced parenthesis"
        );
        assert_eq!(error.syntax_position(), Some(4));

        let error = LecternError::analysis("bad token");
        assert_eq!(error.to_string(), "Analysis error: bad token");
        assert_eq!(error.syntax_position(), None);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let lectern_error = LecternError::from(io_error);

        match lectern_error {
            LecternError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
