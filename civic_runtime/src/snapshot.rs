//! Snapshot layer: periodic on-disk copies of the game state.
//!
//! Snapshots contain canonical JSON + hash for verification.
//! They are backups: the store record stays authoritative.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use civic_engine::config::Rules;
use civic_engine::domain::GameState;
use civic_engine::hashing::{canonical_serialize, hex_digest};
use civic_engine::invariants::try_validate_invariants;

use crate::codec::CodecError;

/// Snapshot on-disk format.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// State version at which this snapshot was taken.
    pub version: u64,
    /// Canonical JSON of the state (UTF-8).
    pub canonical_json: String,
    /// SHA-256 of the canonical JSON.
    pub hash: String,
    pub schema_version: u32,
}

#[derive(Deserialize)]
struct CanonicalEnvelope {
    #[allow(dead_code)]
    schema_version: u32,
    state: GameState,
}

fn snapshot_path(dir: &Path, version: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", version))
}

pub fn save_snapshot(dir: &Path, state: &GameState) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let canonical_bytes = canonical_serialize(state);
    let hash = hex_digest(&canonical_bytes);
    let canonical_json = String::from_utf8(canonical_bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let snap = Snapshot {
        version: state.version,
        canonical_json,
        hash,
        schema_version: civic_engine::STATE_SCHEMA_VERSION,
    };

    let path = snapshot_path(dir, state.version);
    let content = serde_json::to_string(&snap)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    Ok(path)
}

/// Load the snapshot taken at `version`, if any.
pub fn load_snapshot(dir: &Path, version: u64) -> io::Result<Option<Snapshot>> {
    let path = snapshot_path(dir, version);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let snap: Snapshot = serde_json::from_str(&content).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("Bad snapshot: {}", e))
    })?;

    Ok(Some(snap))
}

/// Load the snapshot with the highest version in `dir`.
pub fn load_latest_snapshot(dir: &Path) -> io::Result<Option<Snapshot>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut best: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        let version = name
            .strip_prefix("snapshot_")
            .and_then(|s| s.strip_suffix(".json"))
            .and_then(|s| s.parse::<u64>().ok());
        if let Some(version) = version {
            best = Some(best.map_or(version, |b| b.max(version)));
        }
    }

    match best {
        Some(version) => load_snapshot(dir, version),
        None => Ok(None),
    }
}

/// True if the hash matches the canonical JSON content.
pub fn verify_snapshot_hash(snap: &Snapshot) -> bool {
    hex_digest(snap.canonical_json.as_bytes()) == snap.hash
}

/// Decode a snapshot back into a validated state.
pub fn restore_snapshot(snap: &Snapshot, rules: &Rules) -> Result<GameState, CodecError> {
    let envelope: CanonicalEnvelope =
        serde_json::from_str(&snap.canonical_json).map_err(CodecError::Deserialization)?;
    try_validate_invariants(&envelope.state, rules).map_err(CodecError::InvariantViolation)?;
    Ok(envelope.state)
}
