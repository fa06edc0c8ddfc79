//! Key-value store abstraction: whole-record get/set plus string lists.
//!
//! The runtime never updates part of a record: the game state is read
//! whole and written whole. `compare_and_set` is the only write used for
//! the game state; it fails when the record changed since it was read.
//!
//! Lists follow Redis semantics: `lpush` prepends, `lrange` takes
//! inclusive indices that may be negative (counted from the tail).

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;

use thiserror::Error;

/// Record holding the encoded game state.
pub const GAME_STATE_KEY: &str = "game_state";
/// List holding encoded audit entries, newest first.
pub const AUDIT_LOG_KEY: &str = "audit_log";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("invalid key {0:?}: must match [a-zA-Z0-9_-]+")]
    InvalidKey(String),

    #[error("corrupt store data: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Opaque persistence collaborator.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write `value` only if the record still equals `expected`
    /// (`None` = record absent). Returns whether the write happened.
    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, StoreError>;

    fn lpush(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn lrange(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>, StoreError>;
}

/// Resolve Redis-style inclusive indices against a list of `len` items.
/// Returns a half-open `start..end` range, or `None` when empty.
pub fn resolve_range(len: usize, start: i64, end: i64) -> Option<(usize, usize)> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };
    if len == 0 || start > end || start >= len || end < 0 {
        return None;
    }
    Some((start as usize, end as usize + 1))
}

/// Keys double as file names in `FileStore`, so both backends restrict them.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty()
        || !key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[derive(Default)]
struct MemoryInner {
    records: HashMap<String, String>,
    lists: HashMap<String, VecDeque<String>>,
}

/// In-process store. Thread-safe; contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.lock()?.records.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.lock()?
            .records
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, StoreError> {
        validate_key(key)?;
        let mut inner = self.lock()?;
        if inner.records.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        inner.records.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    fn lpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.lock()?
            .lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    fn lrange(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>, StoreError> {
        validate_key(key)?;
        let inner = self.lock()?;
        let Some(list) = inner.lists.get(key) else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(list.len(), start, end) {
            Some((from, to)) => list.range(from..to).cloned().collect(),
            None => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_range() {
        assert_eq!(resolve_range(5, 0, -1), Some((0, 5)));
        assert_eq!(resolve_range(5, 1, 2), Some((1, 3)));
        assert_eq!(resolve_range(5, -2, -1), Some((3, 5)));
        assert_eq!(resolve_range(5, 0, 100), Some((0, 5)));
        assert_eq!(resolve_range(5, -100, 0), Some((0, 1)));
        assert_eq!(resolve_range(5, 3, 1), None);
        assert_eq!(resolve_range(5, 7, 9), None);
        assert_eq!(resolve_range(0, 0, -1), None);
    }

    #[test]
    fn test_memory_compare_and_set() {
        let store = MemoryStore::new();
        assert!(store.compare_and_set("k", None, "v1").expect("cas"));
        assert!(!store.compare_and_set("k", None, "v2").expect("cas"));
        assert!(!store.compare_and_set("k", Some("nope"), "v2").expect("cas"));
        assert!(store.compare_and_set("k", Some("v1"), "v2").expect("cas"));
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v2"));
    }

    #[test]
    fn test_memory_lists_are_newest_first() {
        let store = MemoryStore::new();
        for v in ["a", "b", "c"] {
            store.lpush("log", v).expect("push");
        }
        assert_eq!(store.lrange("log", 0, -1).expect("range"), vec!["c", "b", "a"]);
        assert_eq!(store.lrange("log", 0, 0).expect("range"), vec!["c"]);
        assert!(store.lrange("missing", 0, -1).expect("range").is_empty());
    }

    #[test]
    fn test_invalid_key_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set("../etc", "x"),
            Err(StoreError::InvalidKey(_))
        ));
    }
}
