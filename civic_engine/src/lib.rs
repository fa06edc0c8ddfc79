#![forbid(unsafe_code)]

//! Civic simulation kernel.
//!
//! Pure transitions over a single `GameState` value. No I/O, no clock,
//! no global state. Persistence and scheduling belong to the runtime.

/// Version of the persisted state layout. Part of the canonical hash.
pub const STATE_SCHEMA_VERSION: u32 = 1;

pub mod arithmetic;
pub mod config;
pub mod error;
pub mod domain;
pub mod actions;
pub mod state;
pub mod oracle;
pub mod transitions;
pub mod admin;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use config::{RelevanceMode, RolePolicy, Rules};
pub use domain::{GameState, Law, LawStatus, Statistic};
pub use engine::Engine;
pub use error::{EngineError, OracleError};
