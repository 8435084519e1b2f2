//! Store error taxonomy
//!
//! Failure kinds are kept distinct end to end: a missing key is `NotFound`,
//! an unreachable store is `Unavailable` with a cause, and each maps to its
//! own response status at the gateway boundary. Nothing in this taxonomy is
//! fatal to the process; a failed operation is reported once to its caller.

use thiserror::Error;

use crate::topology::PolicyViolation;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a store operation that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested key holds no entry.
    #[error("key not found")]
    NotFound,

    /// The store tier could not be reached or did not behave like a store.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] UnavailableCause),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Why the store tier was unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnavailableCause {
    /// Service discovery produced no address for the store tier.
    #[error("discovery failed for '{service}': {detail}")]
    ResolutionFailed { service: String, detail: String },

    /// The connectivity policy denied the connection attempt.
    #[error("connectivity policy denied: {0}")]
    PolicyDenied(#[from] PolicyViolation),

    /// Connection-level failure: refusal, reset, timeout, closed socket.
    #[error("connection error: {0}")]
    Io(String),

    /// The peer replied with something that is not the store's wire protocol.
    #[error("wire protocol violation: {0}")]
    Protocol(String),

    /// The store itself rejected the command.
    #[error("store error reply: {0}")]
    ErrorReply(String),

    /// An earlier connection failure opened the breaker; the operation was
    /// failed fast without dialing.
    #[error("store marked degraded, failing fast")]
    CircuitOpen,
}

impl UnavailableCause {
    /// Whether this cause indicates a connection-level failure that should
    /// degrade the client, as opposed to a per-operation outcome.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::ResolutionFailed { .. } | Self::Io(_) | Self::Protocol(_)
        )
    }
}
