/// Civic kernel: State Construction

use std::collections::BTreeMap;

use crate::config::Rules;
use crate::domain::{
    CitizenActions, GameState, Polls, PositionsOfPower, Statistics, VotingRecords,
};

/// The invariant-satisfying zero state under default rules.
pub fn default_state() -> GameState {
    create_initial_state(&Rules::default())
}

/// Fresh state with every statistic at `rules.baseline_statistic`.
pub fn create_initial_state(rules: &Rules) -> GameState {
    GameState {
        version: 0,
        statistics: Statistics::uniform(rules.baseline_statistic),
        event_history: Vec::new(),
        law_history: Vec::new(),
        laws: Vec::new(),
        polls: Polls::default(),
        citizen_actions: CitizenActions::default(),
        positions_of_power: PositionsOfPower::default(),
        voting_records: VotingRecords::default(),
        last_action_times: BTreeMap::new(),
        last_executive_order_time: 0,
    }
}

/// Discard `previous` and rebuild from defaults with one notice event.
///
/// The version keeps counting from `previous` so persisted records stay
/// strictly ordered across resets.
pub fn reset_state(previous: &GameState, rules: &Rules, notice: &str) -> GameState {
    let mut fresh = create_initial_state(rules);
    fresh.version = previous.version;
    fresh.event_history.push(notice.to_string());
    fresh
}
