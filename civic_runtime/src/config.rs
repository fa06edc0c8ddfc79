//! Runtime configuration, loaded from a JSON file.
//!
//! Every field is optional; missing fields take the defaults below.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use civic_engine::config::{RolePolicy, Rules};

pub const DEFAULT_MAX_RETRIES: u32 = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Directory for the file store. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub rules: Rules,
    pub admins: BTreeSet<String>,
    /// Extra attempts after a lost compare-and-set race.
    pub max_retries: u32,
    /// Snapshot every N versions; 0 disables snapshots.
    pub snapshot_interval: u64,
    /// Seed for event draws; `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            rules: Rules::default(),
            admins: BTreeSet::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            snapshot_interval: 0,
            rng_seed: None,
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn role_policy(&self) -> RolePolicy {
        RolePolicy {
            admins: self.admins.clone(),
        }
    }

    pub fn snapshot_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("snapshots"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: RuntimeConfig = serde_json::from_str(
            r#"{"admins": ["root"], "rules": {"coup_threshold": 60}, "rng_seed": 4}"#,
        )
        .expect("parse");
        assert!(config.role_policy().is_admin("root"));
        assert_eq!(config.rules.coup_threshold, 60);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.snapshot_dir(), None);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<RuntimeConfig>(r#"{"admin": ["root"]}"#).is_err());
    }
}
