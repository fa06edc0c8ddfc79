/// Civic kernel: Canonical Hashing
///
/// Deterministic serialization + SHA-256.
///
/// Rules:
///   - schema_version is the first field
///   - struct fields in declaration order, maps in key order (BTreeMap)
///   - UTF-8 JSON, no whitespace

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::GameState;
use crate::STATE_SCHEMA_VERSION;

/// Canonical UTF-8 JSON bytes of the state.
pub fn canonical_serialize(state: &GameState) -> Vec<u8> {
    let mut root = Map::new();
    root.insert(
        "schema_version".to_string(),
        Value::Number(STATE_SCHEMA_VERSION.into()),
    );
    // GameState holds only strings, integers, bools and string-keyed maps,
    // so serialization cannot fail.
    let body = serde_json::to_value(state)
        .expect("canonical_serialize: GameState is always representable as JSON");
    root.insert("state".to_string(), body);
    serde_json::to_vec(&Value::Object(root))
        .expect("canonical_serialize: JSON serialization failed")
}

/// SHA-256 of the canonical serialization, lowercase hex.
pub fn canonical_hash(state: &GameState) -> String {
    hex_digest(&canonical_serialize(state))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::default_state;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(canonical_hash(&default_state()), canonical_hash(&default_state()));
        assert_eq!(canonical_hash(&default_state()).len(), 64);
    }

    #[test]
    fn test_hash_tracks_content() {
        let mut state = default_state();
        let before = canonical_hash(&state);
        state.statistics.economy += 1;
        assert_ne!(before, canonical_hash(&state));
    }

    #[test]
    fn test_schema_version_leads() {
        let json = String::from_utf8(canonical_serialize(&default_state())).expect("utf8");
        assert!(json.starts_with("{\"schema_version\":1,"));
    }

    #[test]
    fn test_populated_state_serializes_whole() {
        let rules = crate::config::Rules::default();
        let state = crate::transitions::draft_law(&default_state(), &rules, "Fund schools", 1_000);
        let state = crate::transitions::vote_president(&state, &rules, "v1", "pat", 2_000)
            .expect("vote");

        let value: Value = serde_json::from_slice(&canonical_serialize(&state)).expect("json");
        let restored: GameState =
            serde_json::from_value(value["state"].clone()).expect("state body");
        assert_eq!(restored, state);
    }
}
