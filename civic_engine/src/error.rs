//! Error taxonomy for rejected transitions.
//!
//! A rejected transition never yields a state; callers persist nothing.

use thiserror::Error;

/// Why a caller-facing transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Caller lacks the role the action requires.
    #[error("permission denied: {actor} is not {required}")]
    Permission { actor: String, required: &'static str },

    /// Referenced law does not exist.
    #[error("law {law_id} not found")]
    NotFound { law_id: u64 },

    /// Caller already voted in this ballot.
    #[error("{voter} has already voted in {ballot}")]
    DuplicateVote { voter: String, ballot: String },

    /// Cooldown window has not elapsed yet.
    #[error("{action} is on cooldown for another {remaining_ms} ms")]
    RateLimit { action: &'static str, remaining_ms: i64 },

    /// Entity is not in the lifecycle state the transition needs.
    #[error("invalid state: {0}")]
    State(String),
}

/// Failure of the external event-content generator.
///
/// Always recovered inside the kernel by substituting a fallback value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("malformed oracle response: {0}")]
    Malformed(String),
}
