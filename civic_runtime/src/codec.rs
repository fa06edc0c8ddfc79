//! State codec: GameState ⇄ the JSON string kept in the store.
//!
//! Pure codec layer. No side effects.
//!
//! - `encode_state`:  GameState → JSON string
//! - `decode_state`:  JSON string → GameState (strict, unknown fields rejected)
//! - `restore_state`: decode + invariant validation

use civic_engine::config::Rules;
use civic_engine::domain::GameState;
use civic_engine::invariants::try_validate_invariants;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("state serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("state deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("stored state violates invariants: {0}")]
    InvariantViolation(String),
}

pub fn encode_state(state: &GameState) -> Result<String, CodecError> {
    serde_json::to_string(state).map_err(CodecError::Serialization)
}

pub fn decode_state(raw: &str) -> Result<GameState, CodecError> {
    serde_json::from_str(raw).map_err(CodecError::Deserialization)
}

/// Decode and reject states no transition could have produced.
pub fn restore_state(raw: &str, rules: &Rules) -> Result<GameState, CodecError> {
    let state = decode_state(raw)?;
    try_validate_invariants(&state, rules).map_err(CodecError::InvariantViolation)?;
    Ok(state)
}
