//! State comparison: what one transition changed.
//!
//! Used to log accepted transitions and by tests. All values are integers.

use std::collections::{BTreeMap, BTreeSet};

use civic_engine::domain::{GameState, Statistic};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDiff {
    pub version_delta: u64,
    /// Non-zero changes only.
    pub statistic_deltas: BTreeMap<Statistic, i64>,
    pub new_events: Vec<String>,
    pub new_law_history: Vec<String>,
    /// `(before, after)` when the presidency changed hands.
    pub president_change: Option<(Option<String>, Option<String>)>,
    pub senators_added: Vec<String>,
    pub senators_removed: Vec<String>,
    /// History was discarded (collapse or coup).
    pub reset: bool,
}

impl StateDiff {
    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.reset {
            parts.push("RESET".to_string());
        }
        for (stat, delta) in &self.statistic_deltas {
            parts.push(format!("{}{:+}", stat, delta));
        }
        if !self.new_events.is_empty() {
            parts.push(format!("{} event(s)", self.new_events.len()));
        }
        if !self.new_law_history.is_empty() {
            parts.push(format!("{} law decision(s)", self.new_law_history.len()));
        }
        if let Some((_, after)) = &self.president_change {
            parts.push(format!("president={}", after.as_deref().unwrap_or("none")));
        }
        if !self.senators_added.is_empty() || !self.senators_removed.is_empty() {
            parts.push(format!(
                "senate +{}/-{}",
                self.senators_added.len(),
                self.senators_removed.len()
            ));
        }
        if parts.is_empty() {
            "no visible change".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Items appended to `after` relative to `before`, or all of `after`
/// when `before` is no longer a prefix.
fn appended(before: &[String], after: &[String]) -> (Vec<String>, bool) {
    if after.len() >= before.len() && after[..before.len()] == *before {
        (after[before.len()..].to_vec(), false)
    } else {
        (after.to_vec(), true)
    }
}

pub fn compare_states(before: &GameState, after: &GameState) -> StateDiff {
    let statistic_deltas = Statistic::ALL
        .into_iter()
        .filter_map(|stat| {
            let delta = after.statistics.get(stat) - before.statistics.get(stat);
            (delta != 0).then_some((stat, delta))
        })
        .collect();

    let (new_events, events_rewritten) = appended(&before.event_history, &after.event_history);
    let (new_law_history, laws_rewritten) = appended(&before.law_history, &after.law_history);

    let president_before = &before.positions_of_power.president;
    let president_after = &after.positions_of_power.president;
    let president_change = (president_before != president_after)
        .then(|| (president_before.clone(), president_after.clone()));

    let seats_before: BTreeSet<&String> = before.positions_of_power.senators.iter().collect();
    let seats_after: BTreeSet<&String> = after.positions_of_power.senators.iter().collect();

    StateDiff {
        version_delta: after.version.saturating_sub(before.version),
        statistic_deltas,
        new_events,
        new_law_history,
        president_change,
        senators_added: seats_after
            .difference(&seats_before)
            .map(|s| s.to_string())
            .collect(),
        senators_removed: seats_before
            .difference(&seats_after)
            .map(|s| s.to_string())
            .collect(),
        reset: events_rewritten || laws_rewritten,
    }
}
