//! civic-sim: drive a session from a JSON script.
//!
//! Usage: civic-sim <config.json> <script.json>
//!
//! The script is an array of steps:
//!   {"actor": "alice", "action": {"type": "vote_senator", "candidate": "bob"}}
//!   {"scheduler": "random_event"}
//!   {"scheduler": "update_senators"}
//!   {"advance_ms": 300000}
//!
//! Rejected actions are logged and the script continues. The final state
//! and audit log are printed as JSON on stdout.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use civic_engine::actions::Action;
use civic_engine::engine::Engine;
use civic_runtime::clock::{Clock, ManualClock, SystemClock};
use civic_runtime::config::RuntimeConfig;
use civic_runtime::file_store::FileStore;
use civic_runtime::oracle::TemplateOracle;
use civic_runtime::session::{Session, SessionError};
use civic_runtime::store::{KeyValueStore, MemoryStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SchedulerJob {
    RandomEvent,
    UpdateSenators,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Step {
    Act { actor: String, action: Action },
    Schedule { scheduler: SchedulerJob },
    Advance { advance_ms: i64 },
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        bail!("usage: {} <config.json> <script.json>", args[0]);
    }
    let config_path = PathBuf::from(&args[1]);
    let script_path = PathBuf::from(&args[2]);

    let config = RuntimeConfig::load(&config_path)?;
    let script: Vec<Step> = serde_json::from_str(
        &fs::read_to_string(&script_path)
            .with_context(|| format!("reading {}", script_path.display()))?,
    )
    .with_context(|| format!("parsing {}", script_path.display()))?;

    let store: Arc<dyn KeyValueStore> = match &config.data_dir {
        Some(dir) => Arc::new(
            FileStore::open(dir).with_context(|| format!("opening store {}", dir.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    };

    let seed = config.rng_seed.unwrap_or_else(|| rand::random());
    let clock = Arc::new(ManualClock::new(SystemClock.now_ms()));
    let engine = Engine::new(config.rules.clone(), config.role_policy());

    let mut session = Session::new(
        engine,
        store,
        Arc::new(TemplateOracle::new(seed)),
        clock.clone(),
    )
    .with_rng(StdRng::seed_from_u64(seed))
    .with_max_retries(config.max_retries);
    if let Some(dir) = config.snapshot_dir() {
        session = session.with_snapshots(dir, config.snapshot_interval);
    }

    info!(steps = script.len(), seed, "running script");
    for (idx, step) in script.iter().enumerate() {
        let result = match step {
            Step::Act { actor, action } => session.apply(actor, action).map(Some),
            Step::Schedule {
                scheduler: SchedulerJob::RandomEvent,
            } => session.simulate_event().map(Some),
            Step::Schedule {
                scheduler: SchedulerJob::UpdateSenators,
            } => session.update_senators().map(Some),
            Step::Advance { advance_ms } => {
                clock.advance(*advance_ms);
                Ok(None)
            }
        };
        match result {
            Ok(Some(state)) => info!(step = idx, version = state.version, "step applied"),
            Ok(None) => {}
            Err(SessionError::Engine(rejected)) => {
                warn!(step = idx, reason = %rejected, "step rejected")
            }
            Err(other) => return Err(other).with_context(|| format!("step {}", idx)),
        }
    }

    let report = serde_json::json!({
        "state": session.state()?,
        "audit_log": session.audit_entries()?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
