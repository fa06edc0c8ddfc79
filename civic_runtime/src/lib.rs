#![forbid(unsafe_code)]

//! Civic simulation runtime.
//!
//! Wraps the pure kernel with persistence, optimistic-concurrency
//! sessions, audit logging, snapshots and an offline event oracle.
//!
//! No game rules live here: every transition is delegated to the kernel.

pub mod store;
pub mod proto_types;
pub mod file_store;
pub mod codec;
pub mod snapshot;
pub mod audit;
pub mod diff;
pub mod clock;
pub mod oracle;
pub mod config;
pub mod session;
