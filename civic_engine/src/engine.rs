/// Civic kernel: Engine
///
/// Top-level orchestrator. Dispatches actions to transitions, validates
/// invariants on every produced state. Holds configuration only, never a
/// game state: the caller owns the state and persists what is returned.

use rand::Rng;
use tracing::debug;

use crate::actions::Action;
use crate::admin;
use crate::config::{RolePolicy, Rules};
use crate::domain::{AuditEntry, GameState};
use crate::error::EngineError;
use crate::invariants::validate_invariants;
use crate::oracle::EventOracle;
use crate::state::create_initial_state;
use crate::transitions;

/// Result of an accepted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub state: GameState,
    /// Present for administrative actions.
    pub audit: Option<AuditEntry>,
}

impl Outcome {
    fn plain(state: GameState) -> Self {
        Self { state, audit: None }
    }

    fn audited((state, entry): (GameState, AuditEntry)) -> Self {
        Self {
            state,
            audit: Some(entry),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    rules: Rules,
    policy: RolePolicy,
}

impl Engine {
    pub fn new(rules: Rules, policy: RolePolicy) -> Self {
        Self { rules, policy }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn policy(&self) -> &RolePolicy {
        &self.policy
    }

    /// Fresh state under this engine's rules.
    pub fn initial_state(&self) -> GameState {
        create_initial_state(&self.rules)
    }

    /// Apply one caller action at time `now` (Unix ms).
    pub fn apply(
        &self,
        state: &GameState,
        actor: &str,
        action: &Action,
        now: i64,
    ) -> Result<Outcome, EngineError> {
        let rules = &self.rules;
        let policy = &self.policy;

        let outcome = match action {
            Action::DraftLaw { text } => {
                Outcome::plain(transitions::draft_law(state, rules, text, now))
            }
            Action::VoteOnLaw { law_id, vote } => Outcome::plain(transitions::vote_on_law(
                state, rules, actor, *law_id, *vote,
            )?),
            Action::PassLaw { law_id } => Outcome::plain(transitions::pass_law_by_president(
                state, rules, actor, *law_id,
            )?),
            Action::VetoLaw { law_id } => Outcome::plain(transitions::veto_law_by_president(
                state, rules, actor, *law_id,
            )?),
            Action::ExecutiveOrder { order } => Outcome::plain(transitions::executive_order(
                state, rules, actor, order, now,
            )?),
            Action::VoteSenator { candidate } => Outcome::plain(transitions::vote_senator(
                state, rules, actor, candidate, now,
            )?),
            Action::VotePresident { candidate } => Outcome::plain(transitions::vote_president(
                state, rules, actor, candidate, now,
            )?),
            Action::VoteToImpeach { vote } => {
                Outcome::plain(transitions::vote_to_impeach(state, rules, actor, *vote)?)
            }
            Action::Protest { amount } => {
                Outcome::plain(transitions::protest(state, rules, actor, *amount, now)?)
            }
            Action::JoinCoup { amount } => {
                Outcome::plain(transitions::join_coup(state, rules, actor, *amount, now)?)
            }
            Action::AdjustStatistic { statistic, delta } => Outcome::audited(
                admin::adjust_statistic(state, rules, policy, actor, *statistic, *delta, now)?,
            ),
            Action::ApproveLaw { law_id } => Outcome::audited(admin::approve_law(
                state, rules, policy, actor, *law_id, now,
            )?),
            Action::ClearUserRecords { username } => Outcome::audited(
                admin::clear_user_records(state, rules, policy, actor, username, now)?,
            ),
        };

        validate_invariants(&outcome.state, rules);
        debug!(
            action = action.kind(),
            actor,
            version = outcome.state.version,
            "action applied"
        );
        Ok(outcome)
    }

    /// Scheduler entry point: one random event.
    pub fn simulate_event<R: Rng>(
        &self,
        state: &GameState,
        oracle: &dyn EventOracle,
        rng: &mut R,
    ) -> GameState {
        let next = transitions::simulate_event(state, &self.rules, oracle, rng);
        validate_invariants(&next, &self.rules);
        debug!(version = next.version, "random event applied");
        next
    }

    /// Scheduler entry point: reseat the senate from the tallies.
    pub fn update_senators(&self, state: &GameState) -> GameState {
        let next = transitions::update_senators(state, &self.rules);
        validate_invariants(&next, &self.rules);
        next
    }
}
