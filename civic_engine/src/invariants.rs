/// Civic kernel: Invariant Checks
///
/// `try_validate_invariants` reports the first violation as an error.
/// `validate_invariants` panics on it: a transition that produces an
/// invalid state is a kernel bug, not a caller error.

use std::collections::BTreeSet;

use crate::config::{Rules, PERCENTAGE_CAP};
use crate::domain::{GameState, Statistic};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn validate_invariants(state: &GameState, rules: &Rules) {
    if let Err(violation) = try_validate_invariants(state, rules) {
        panic!("Invariant violation: {}", violation);
    }
}

pub fn try_validate_invariants(state: &GameState, rules: &Rules) -> Result<(), String> {
    check_statistics_non_negative(state)?;
    check_not_collapsed(state, rules)?;
    check_percentages(state)?;
    check_senate_size(state, rules)?;
    check_unique_law_ids(state)?;
    check_law_ledgers(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

fn check_statistics_non_negative(state: &GameState) -> Result<(), String> {
    for stat in Statistic::ALL {
        let value = state.statistics.get(stat);
        if value < 0 {
            return Err(format!(
                "[INVARIANT:non_negative_statistics] {} is {}",
                stat, value
            ));
        }
    }
    Ok(())
}

/// A zero mean must already have been turned into a reset.
fn check_not_collapsed(state: &GameState, rules: &Rules) -> Result<(), String> {
    if rules.baseline_statistic > 0 && state.statistics.is_collapsed() {
        return Err(
            "[INVARIANT:collapse_reset] statistics average zero but no reset happened".to_string(),
        );
    }
    Ok(())
}

fn check_percentages(state: &GameState) -> Result<(), String> {
    let actions = &state.citizen_actions;
    if actions.protest_percentage > PERCENTAGE_CAP || actions.coup_percentage > PERCENTAGE_CAP {
        return Err(format!(
            "[INVARIANT:percentage_range] protest={} coup={}",
            actions.protest_percentage, actions.coup_percentage
        ));
    }
    Ok(())
}

fn check_senate_size(state: &GameState, rules: &Rules) -> Result<(), String> {
    let senators = &state.positions_of_power.senators;
    if senators.len() > rules.max_senators {
        return Err(format!(
            "[INVARIANT:senate_size] {} senators, at most {} allowed",
            senators.len(),
            rules.max_senators
        ));
    }
    let unique: BTreeSet<&String> = senators.iter().collect();
    if unique.len() != senators.len() {
        return Err("[INVARIANT:senate_size] duplicate senator seat".to_string());
    }
    Ok(())
}

fn check_unique_law_ids(state: &GameState) -> Result<(), String> {
    let mut seen = BTreeSet::new();
    for law in &state.laws {
        if !seen.insert(law.id) {
            return Err(format!("[INVARIANT:unique_law_ids] law id {} repeats", law.id));
        }
    }
    Ok(())
}

/// Counters must agree with the per-senator ballot ledger.
fn check_law_ledgers(state: &GameState) -> Result<(), String> {
    for law in &state.laws {
        let yes = law.votes.values().filter(|v| **v).count();
        let no = law.votes.len() - yes;
        if law.votes_for as usize != yes || law.votes_against as usize != no {
            return Err(format!(
                "[INVARIANT:law_ledger] law {} counts {}/{} but ledger holds {}/{}",
                law.id, law.votes_for, law.votes_against, yes, no
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::default_state;
    use crate::transitions::draft_law;

    #[test]
    fn test_default_state_is_valid() {
        validate_invariants(&default_state(), &Rules::default());
    }

    #[test]
    fn test_negative_statistic_detected() {
        let mut state = default_state();
        state.statistics.education = -1;
        let err = try_validate_invariants(&state, &Rules::default()).unwrap_err();
        assert!(err.contains("non_negative_statistics"));
    }

    #[test]
    fn test_ledger_mismatch_detected() {
        let rules = Rules::default();
        let mut state = draft_law(&default_state(), &rules, "x", 1);
        state.laws[0].votes_for = 3;
        let err = try_validate_invariants(&state, &rules).unwrap_err();
        assert!(err.contains("law_ledger"));
    }

    #[test]
    #[should_panic(expected = "senate_size")]
    fn test_oversized_senate_panics() {
        let mut state = default_state();
        state.positions_of_power.senators = (0..41).map(|i| format!("s{}", i)).collect();
        validate_invariants(&state, &Rules::default());
    }
}
