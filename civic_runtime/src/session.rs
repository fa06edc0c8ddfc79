//! Session: read-modify-write of the global game state with optimistic
//! concurrency.
//!
//! Each operation:
//!   1. reads the record (creating the default state if absent)
//!   2. runs the kernel transition on the decoded state
//!   3. writes with compare_and_set against the exact record read
//!   4. on a lost race re-reads and retries, up to `max_retries` times
//!
//! Every accepted transition bumps `version`, so the record read acts as
//! a version token. The kernel may reject before step 3; nothing is
//! written then. Audit entries and snapshots follow a successful write;
//! their failures are logged and never undo or fail the commit.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};

use civic_engine::actions::Action;
use civic_engine::domain::{AuditEntry, GameState};
use civic_engine::engine::Engine;
use civic_engine::error::EngineError;
use civic_engine::oracle::EventOracle;

use crate::audit::AuditLog;
use crate::clock::Clock;
use crate::codec::{encode_state, restore_state, CodecError};
use crate::config::DEFAULT_MAX_RETRIES;
use crate::diff::compare_states;
use crate::snapshot;
use crate::store::{KeyValueStore, StoreError, GAME_STATE_KEY};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("gave up after {attempts} conflicting writes")]
    Contention { attempts: u32 },

    #[error("session rng lock poisoned")]
    Poisoned,
}

type Transition<'a> =
    dyn FnMut(&GameState, i64) -> Result<(GameState, Option<AuditEntry>), SessionError> + 'a;

pub struct Session {
    engine: Engine,
    store: Arc<dyn KeyValueStore>,
    audit: AuditLog,
    oracle: Arc<dyn EventOracle + Send + Sync>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    max_retries: u32,
    snapshot_dir: Option<PathBuf>,
    snapshot_interval: u64,
}

impl Session {
    pub fn new(
        engine: Engine,
        store: Arc<dyn KeyValueStore>,
        oracle: Arc<dyn EventOracle + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            audit: AuditLog::new(Arc::clone(&store)),
            store,
            oracle,
            clock,
            rng: Mutex::new(StdRng::from_entropy()),
            max_retries: DEFAULT_MAX_RETRIES,
            snapshot_dir: None,
            snapshot_interval: 0,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Snapshot every `interval` versions into `dir`. 0 disables.
    pub fn with_snapshots(mut self, dir: PathBuf, interval: u64) -> Self {
        self.snapshot_dir = Some(dir);
        self.snapshot_interval = interval;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Current state; the default state if nothing is stored yet.
    pub fn state(&self) -> Result<GameState, SessionError> {
        Ok(self.read()?.1)
    }

    pub fn audit_entries(&self) -> Result<Vec<AuditEntry>, SessionError> {
        Ok(self.audit.entries()?)
    }

    /// Apply one caller action.
    pub fn apply(&self, actor: &str, action: &Action) -> Result<GameState, SessionError> {
        self.commit(action.kind(), &mut |state, now| {
            let outcome = self.engine.apply(state, actor, action, now)?;
            Ok((outcome.state, outcome.audit))
        })
    }

    /// Scheduler hook: one random event.
    pub fn simulate_event(&self) -> Result<GameState, SessionError> {
        self.commit("simulate_event", &mut |state, _now| {
            let mut rng = self.rng.lock().map_err(|_| SessionError::Poisoned)?;
            let next = self
                .engine
                .simulate_event(state, self.oracle.as_ref(), &mut *rng);
            Ok((next, None))
        })
    }

    /// Scheduler hook: reseat the senate.
    pub fn update_senators(&self) -> Result<GameState, SessionError> {
        self.commit("update_senators", &mut |state, _now| {
            Ok((self.engine.update_senators(state), None))
        })
    }

    /// Raw record plus decoded state. Absent record → initial state.
    fn read(&self) -> Result<(Option<String>, GameState), SessionError> {
        match self.store.get(GAME_STATE_KEY)? {
            Some(raw) => {
                let state = restore_state(&raw, self.engine.rules())?;
                Ok((Some(raw), state))
            }
            None => Ok((None, self.engine.initial_state())),
        }
    }

    fn commit(&self, label: &str, transition: &mut Transition<'_>) -> Result<GameState, SessionError> {
        let attempts = self.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let (raw, current) = self.read()?;
            let now = self.clock.now_ms();
            let (next, audit) = transition(&current, now)?;
            let encoded = encode_state(&next)?;

            if !self
                .store
                .compare_and_set(GAME_STATE_KEY, raw.as_deref(), &encoded)?
            {
                warn!(
                    label,
                    attempt,
                    version = current.version,
                    "state changed underneath, retrying"
                );
                continue;
            }

            // State is committed; audit failures are only logged.
            if let Some(entry) = &audit {
                if let Err(e) = self.audit.record(entry) {
                    warn!(
                        label,
                        version = next.version,
                        error = %e,
                        details = %entry.details,
                        "audit entry not recorded"
                    );
                }
            }

            let diff = compare_states(&current, &next);
            if diff.reset {
                info!(label, version = next.version, "simulation reset");
            }
            debug!(label, version = next.version, changes = %diff.summary(), "committed");

            self.maybe_snapshot(&next);
            return Ok(next);
        }

        Err(SessionError::Contention { attempts })
    }

    fn maybe_snapshot(&self, state: &GameState) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };
        if self.snapshot_interval == 0 || state.version % self.snapshot_interval != 0 {
            return;
        }
        // The record is already committed; a failed backup is only logged.
        match snapshot::save_snapshot(dir, state) {
            Ok(path) => debug!(path = %path.display(), "snapshot written"),
            Err(e) => warn!(error = %e, "snapshot failed"),
        }
    }
}
