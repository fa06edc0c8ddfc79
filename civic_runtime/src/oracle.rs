//! Offline event oracle.
//!
//! Stands in for the language-model generator: canned headlines per
//! tier with seeded random effects, answered in the same raw JSON shape
//! a remote generator returns. Relevance is a keyword match.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use civic_engine::domain::{Effects, Statistic};
use civic_engine::error::OracleError;
use civic_engine::oracle::{EventOracle, Tier};

const MINOR_EVENTS: &[&str] = &[
    "A regional festival draws unexpected crowds.",
    "A small tech startup announces a breakthrough.",
    "Heavy rains delay harvests in the north.",
    "A teachers' union stages a one-day strike.",
];

const MAJOR_EVENTS: &[&str] = &[
    "A trade dispute escalates with a neighbouring nation.",
    "A pandemic wave strains hospitals nationwide.",
    "A major bank collapses after a fraud scandal.",
    "A border skirmish puts the army on high alert.",
];

const CRISIS_EVENTS: &[&str] = &[
    "A catastrophic earthquake devastates the capital.",
    "A nationwide cyberattack cripples infrastructure.",
    "Hyperinflation wipes out household savings.",
];

/// Largest absolute effect per tier.
fn magnitude(tier: Tier) -> i64 {
    match tier {
        Tier::Minor => 5,
        Tier::Major => 15,
        Tier::Crisis => 30,
    }
}

/// Keywords that tie law text to a statistic.
fn keywords(stat: Statistic) -> &'static [&'static str] {
    match stat {
        Statistic::Military => &["military", "army", "defense", "defence"],
        Statistic::Economy => &["economy", "tax", "trade", "budget"],
        Statistic::Healthcare => &["health", "hospital", "medic"],
        Statistic::Welfare => &["welfare", "pension", "housing"],
        Statistic::Education => &["education", "school", "universit"],
        Statistic::Technology => &["technology", "research", "internet"],
    }
}

pub struct TemplateOracle {
    rng: Mutex<StdRng>,
}

impl TemplateOracle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl EventOracle for TemplateOracle {
    fn generate(&self, tier: Tier) -> Result<String, OracleError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| OracleError::Unavailable("oracle rng poisoned".to_string()))?;

        let pool = match tier {
            Tier::Minor => MINOR_EVENTS,
            Tier::Major => MAJOR_EVENTS,
            Tier::Crisis => CRISIS_EVENTS,
        };
        let description = pool
            .choose(&mut *rng)
            .ok_or_else(|| OracleError::Unavailable("empty event pool".to_string()))?;

        let max = magnitude(tier);
        let touched = rng.gen_range(1..=3usize);
        let effects: Effects = Statistic::ALL
            .choose_multiple(&mut *rng, touched)
            .map(|stat| (*stat, rng.gen_range(-max..=max)))
            .collect();

        serde_json::to_string(&serde_json::json!({
            "description": description,
            "effects": effects,
        }))
        .map_err(|e| OracleError::Malformed(e.to_string()))
    }

    fn judge_relevance(&self, law_text: &str, statistic: Statistic) -> Result<String, OracleError> {
        let text = law_text.to_ascii_lowercase();
        let hit = keywords(statistic).iter().any(|k| text.contains(k));
        Ok(if hit { "yes" } else { "no" }.to_string())
    }
}
