//! Event-content oracle contract.
//!
//! The oracle is an external text generator. Its raw answers are decoded
//! here against a strict schema; anything that fails to decode becomes
//! the zero-effect fallback event.

use std::fmt;

use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{Effects, Statistic};
use crate::error::OracleError;

/// Severity tier of a random event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Minor,
    Major,
    Crisis,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Minor, Tier::Major, Tier::Crisis];

    /// Upper-case label used as the description prefix.
    pub fn label(self) -> &'static str {
        match self {
            Tier::Minor => "MINOR",
            Tier::Major => "MAJOR",
            Tier::Crisis => "CRISIS",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weighted draw over percent weights `[minor, major, crisis]`.
///
/// A roll in `[0, 100)` picks the first tier whose cumulative weight
/// exceeds it; rolls past the total land on the last tier.
pub fn draw_tier<R: Rng>(rng: &mut R, weights: &[u32; 3]) -> Tier {
    let roll = rng.gen_range(0..100u32);
    tier_for_roll(roll, weights)
}

pub fn tier_for_roll(roll: u32, weights: &[u32; 3]) -> Tier {
    let mut cumulative = 0u32;
    for (tier, weight) in Tier::ALL.into_iter().zip(weights.iter()) {
        cumulative = cumulative.saturating_add(*weight);
        if roll < cumulative {
            return tier;
        }
    }
    Tier::Crisis
}

/// Decoded event content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventPayload {
    pub description: String,
    pub effects: Effects,
}

impl EventPayload {
    /// Zero-effect event substituted whenever the oracle fails.
    pub fn fallback() -> Self {
        Self {
            description: "A quiet period passes with no notable developments.".to_string(),
            effects: Statistic::ALL.into_iter().map(|s| (s, 0)).collect(),
        }
    }

    /// Strict decode of a raw oracle answer.
    ///
    /// Text around the outermost JSON object (code fences, preamble) is
    /// ignored. Unknown fields, unknown statistic names, non-integer
    /// effects and blank descriptions are all rejected.
    pub fn decode(raw: &str) -> Result<Self, OracleError> {
        let body = extract_json_object(raw)
            .ok_or_else(|| OracleError::Malformed("no JSON object in response".to_string()))?;
        let payload: EventPayload = serde_json::from_str(body)
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        if payload.description.trim().is_empty() {
            return Err(OracleError::Malformed("empty description".to_string()));
        }
        Ok(payload)
    }
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// External generator of event content.
pub trait EventOracle {
    /// Raw answer describing one event of the given tier.
    fn generate(&self, tier: Tier) -> Result<String, OracleError>;

    /// Raw yes/no answer: is `law_text` relevant to `statistic`?
    fn judge_relevance(&self, law_text: &str, statistic: Statistic) -> Result<String, OracleError> {
        let _ = (law_text, statistic);
        Err(OracleError::Unavailable(
            "relevance queries not supported".to_string(),
        ))
    }
}

/// Ask for an event, never failing.
pub fn request_event(oracle: &dyn EventOracle, tier: Tier) -> EventPayload {
    match oracle.generate(tier).and_then(|raw| EventPayload::decode(&raw)) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(%tier, error = %err, "oracle failed, using fallback event");
            EventPayload::fallback()
        }
    }
}

/// Ask whether a law bears on a statistic. Failures count as "no".
pub fn is_relevant(oracle: &dyn EventOracle, law_text: &str, statistic: Statistic) -> bool {
    match oracle
        .judge_relevance(law_text, statistic)
        .and_then(|raw| parse_relevance(&raw))
    {
        Ok(relevant) => relevant,
        Err(err) => {
            debug!(%statistic, error = %err, "relevance query failed, treating as irrelevant");
            false
        }
    }
}

pub fn parse_relevance(raw: &str) -> Result<bool, OracleError> {
    let answer = raw
        .trim()
        .trim_end_matches(|c: char| c == '.' || c == '!')
        .to_ascii_lowercase();
    match answer.as_str() {
        "yes" | "true" => Ok(true),
        "no" | "false" => Ok(false),
        _ => Err(OracleError::Malformed(format!(
            "expected yes/no, got {:?}",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Broken;

    impl EventOracle for Broken {
        fn generate(&self, _tier: Tier) -> Result<String, OracleError> {
            Err(OracleError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_tier_for_roll_boundaries() {
        let w = [70, 25, 5];
        assert_eq!(tier_for_roll(0, &w), Tier::Minor);
        assert_eq!(tier_for_roll(69, &w), Tier::Minor);
        assert_eq!(tier_for_roll(70, &w), Tier::Major);
        assert_eq!(tier_for_roll(94, &w), Tier::Major);
        assert_eq!(tier_for_roll(95, &w), Tier::Crisis);
        assert_eq!(tier_for_roll(99, &w), Tier::Crisis);
    }

    #[test]
    fn test_draw_tier_is_seeded() {
        let w = [70, 25, 5];
        let a: Vec<Tier> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..20).map(|_| draw_tier(&mut rng, &w)).collect()
        };
        let b: Vec<Tier> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..20).map(|_| draw_tier(&mut rng, &w)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_accepts_fenced_json() {
        let raw = "Here you go:\n```json\n{\"description\": \"Floods\", \"effects\": {\"welfare\": -5, \"economy\": -3}}\n```";
        let payload = EventPayload::decode(raw).expect("decode");
        assert_eq!(payload.description, "Floods");
        assert_eq!(payload.effects[&Statistic::Welfare], -5);
        assert_eq!(payload.effects[&Statistic::Economy], -3);
    }

    #[test]
    fn test_decode_rejects_bad_schema() {
        assert!(EventPayload::decode("no json here").is_err());
        assert!(EventPayload::decode(r#"{"description": "x", "effects": {"happiness": 3}}"#).is_err());
        assert!(EventPayload::decode(r#"{"description": "x", "effects": {"economy": 1.5}}"#).is_err());
        assert!(EventPayload::decode(r#"{"description": " ", "effects": {}}"#).is_err());
        assert!(EventPayload::decode(r#"{"description": "x", "effects": {}, "mood": 1}"#).is_err());
    }

    #[test]
    fn test_request_event_falls_back() {
        let payload = request_event(&Broken, Tier::Crisis);
        assert_eq!(payload, EventPayload::fallback());
        assert!(payload.effects.values().all(|v| *v == 0));
        assert!(!is_relevant(&Broken, "law", Statistic::Economy));
    }

    #[test]
    fn test_parse_relevance() {
        assert_eq!(parse_relevance(" Yes. "), Ok(true));
        assert_eq!(parse_relevance("FALSE"), Ok(false));
        assert!(parse_relevance("maybe").is_err());
    }
}
