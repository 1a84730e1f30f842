//! Domain-specific error types for the angler session engine.
//!
//! Every fallible operation returns `Result<T, AnglerError>`. Transport
//! faults are recoverable by reconnecting; nothing here is meant to
//! take the process down.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the session engine.
#[derive(Debug, Error)]
pub enum AnglerError {
    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The outbound command channel was closed (writer task gone).
    #[error("channel closed")]
    ChannelClosed,

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A connection status transition was requested from the wrong state.
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),

    // ── Collaborator Errors ──────────────────────────────────────
    /// The advisor failed to produce a decision.
    #[error("advisor error: {0}")]
    Advisor(String),

    /// The leaderboard could not be fetched or decoded.
    #[error("leaderboard error: {0}")]
    Leaderboard(String),

    // ── Other ────────────────────────────────────────────────────
    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for AnglerError {
    fn from(s: String) -> Self {
        AnglerError::Other(s)
    }
}

impl From<&str> for AnglerError {
    fn from(s: &str) -> Self {
        AnglerError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AnglerError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AnglerError::ChannelClosed
    }
}

impl AnglerError {
    /// Whether this error means the current connection is unusable and
    /// the reconnect supervisor should take over.
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            AnglerError::Connection(_) | AnglerError::ChannelClosed | AnglerError::Timeout(_)
        )
    }
}
