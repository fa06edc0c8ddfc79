/// Civic kernel: Centralized Transition Logic
///
/// ALL player-facing state mutation lives here.
/// Every function takes the current state by reference and returns a new
/// state; the input is never touched, so a rejected transition leaves
/// nothing to undo. Every accepted transition bumps `version` exactly once.

use rand::Rng;
use tracing::info;

use crate::arithmetic::{add_percentage, remaining_cooldown, scale_by_percent, supermajority};
use crate::config::{RelevanceMode, Rules, PERCENTAGE_CAP};
use crate::domain::{
    increment_tally, ActionTimes, Effects, ExecutiveOrder, GameState, Law, LawStatus, Statistic,
};
use crate::error::EngineError;
use crate::oracle::{draw_tier, is_relevant, request_event, EventOracle};
use crate::state::reset_state;

pub const COLLAPSE_NOTICE: &str =
    "[COLLAPSE] National statistics have collapsed to zero. The nation has been rebuilt from scratch.";
pub const COUP_NOTICE: &str =
    "[COUP] Citizens have seized power in a coup. The nation has been rebuilt from scratch.";
pub const EXECUTIVE_ORDER_TAG: &str = "[EXECUTIVE ORDER]";

// ---------------------------------------------------------------------------
// Random events
// ---------------------------------------------------------------------------

/// Draw a tier, fetch content from the oracle and apply it.
///
/// Oracle failures never escape: the zero-effect fallback event is used.
pub fn simulate_event<R: Rng>(
    state: &GameState,
    rules: &Rules,
    oracle: &dyn EventOracle,
    rng: &mut R,
) -> GameState {
    let mut next = state.clone();

    let tier = draw_tier(rng, &rules.tier_weights);
    let payload = request_event(oracle, tier);

    let effects = match rules.relevance_mode {
        RelevanceMode::Disabled => payload.effects,
        RelevanceMode::PerLaw => adjust_for_laws(state, rules, oracle, payload.effects),
    };

    next.statistics.apply_effects(&effects);
    next.event_history
        .push(format!("[{}] {}", tier.label(), payload.description));

    finish(next, rules)
}

/// Soften negative and amplify positive effects once per passed law the
/// oracle judges relevant to that statistic.
fn adjust_for_laws(
    state: &GameState,
    rules: &Rules,
    oracle: &dyn EventOracle,
    effects: Effects,
) -> Effects {
    let passed: Vec<&Law> = state
        .laws
        .iter()
        .filter(|law| law.status == LawStatus::Passed)
        .collect();

    effects
        .into_iter()
        .map(|(stat, delta)| {
            if delta == 0 || passed.is_empty() {
                return (stat, delta);
            }
            let relevant = passed
                .iter()
                .filter(|law| is_relevant(oracle, &law.text, stat))
                .count();
            let scaled = (0..relevant).fold(delta, |value, _| {
                let percent = if value < 0 {
                    rules.relevant_negative_scale
                } else {
                    rules.relevant_positive_scale
                };
                scale_by_percent(value, percent)
            });
            (stat, scaled)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Legislature
// ---------------------------------------------------------------------------

/// Append a new pending law. Anyone may draft.
pub fn draft_law(state: &GameState, rules: &Rules, text: &str, now: i64) -> GameState {
    let mut next = state.clone();

    // Ids come from the creation time; bump past any collision.
    let now_id = u64::try_from(now).unwrap_or(0);
    let id = match next.laws.iter().map(|l| l.id).max() {
        Some(max) if max >= now_id => max + 1,
        _ => now_id,
    };

    next.laws.push(Law {
        id,
        text: text.to_string(),
        votes_for: 0,
        votes_against: 0,
        status: LawStatus::Pending,
        created_at: now,
        votes: Default::default(),
    });

    finish(next, rules)
}

pub fn vote_on_law(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    law_id: u64,
    vote: bool,
) -> Result<GameState, EngineError> {
    require_senator(state, voter)?;

    let law = state.law(law_id).ok_or(EngineError::NotFound { law_id })?;
    if law.votes.contains_key(voter) {
        return Err(EngineError::DuplicateVote {
            voter: voter.to_string(),
            ballot: format!("law {}", law_id),
        });
    }
    if law.status != LawStatus::Pending {
        return Err(EngineError::State(format!(
            "law {} is {}, not pending",
            law_id,
            law.status.as_str()
        )));
    }

    let mut next = state.clone();
    let senate_size = next.positions_of_power.senators.len();
    let (num, den) = rules.law_majority;
    let threshold = supermajority(senate_size, num, den);

    let law = next.law_mut(law_id).ok_or(EngineError::NotFound { law_id })?;
    law.votes.insert(voter.to_string(), vote);
    if vote {
        law.votes_for += 1;
    } else {
        law.votes_against += 1;
    }
    if law.votes_for as usize >= threshold {
        law.status = LawStatus::AwaitingPresident;
        info!(law_id, votes_for = law.votes_for, threshold, "law sent to the president");
    }

    Ok(finish(next, rules))
}

pub fn pass_law_by_president(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    law_id: u64,
) -> Result<GameState, EngineError> {
    decide_law(state, rules, voter, law_id, LawStatus::Passed)
}

pub fn veto_law_by_president(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    law_id: u64,
) -> Result<GameState, EngineError> {
    decide_law(state, rules, voter, law_id, LawStatus::Vetoed)
}

fn decide_law(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    law_id: u64,
    outcome: LawStatus,
) -> Result<GameState, EngineError> {
    require_president(state, voter)?;

    let law = state.law(law_id).ok_or(EngineError::NotFound { law_id })?;
    if law.status != LawStatus::AwaitingPresident {
        return Err(EngineError::State(format!(
            "law {} is {}, not awaiting_president",
            law_id,
            law.status.as_str()
        )));
    }

    let mut next = state.clone();
    let law = next.law_mut(law_id).ok_or(EngineError::NotFound { law_id })?;
    law.status = outcome;
    let summary = format!(
        "Law #{} \"{}\" {} by President {} ({} for, {} against)",
        law.id,
        law.text,
        outcome.as_str(),
        voter,
        law.votes_for,
        law.votes_against
    );
    next.law_history.push(summary);

    Ok(finish(next, rules))
}

pub fn executive_order(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    order: &ExecutiveOrder,
    now: i64,
) -> Result<GameState, EngineError> {
    require_president(state, voter)?;

    // Zero means no order has ever been issued.
    let last = (state.last_executive_order_time > 0).then_some(state.last_executive_order_time);
    check_cooldown(last, now, rules.executive_order_cooldown_ms, "executive_order")?;

    let mut next = state.clone();
    next.statistics.apply_effects(&order.effects);
    next.event_history
        .push(format!("{} {}", EXECUTIVE_ORDER_TAG, order.description));
    next.last_executive_order_time = now;

    Ok(finish(next, rules))
}

// ---------------------------------------------------------------------------
// Elections
// ---------------------------------------------------------------------------

pub fn vote_senator(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    candidate: &str,
    now: i64,
) -> Result<GameState, EngineError> {
    let last = state.voting_records.senator.get(voter).copied();
    check_cooldown(last, now, rules.senator_vote_cooldown_ms, "vote_senator")?;

    let mut next = state.clone();
    next.voting_records.senator.insert(voter.to_string(), now);
    increment_tally(&mut next.polls.senator, candidate);

    Ok(finish(next, rules))
}

/// Record a presidential vote and install the chosen candidate at once.
///
/// There is no election close: the latest vote decides the office.
pub fn vote_president(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    candidate: &str,
    now: i64,
) -> Result<GameState, EngineError> {
    let last = state.voting_records.president.get(voter).copied();
    check_cooldown(last, now, rules.president_vote_cooldown_ms, "vote_president")?;

    let mut next = state.clone();
    next.voting_records.president.insert(voter.to_string(), now);
    increment_tally(&mut next.polls.president, candidate);

    if !next.positions_of_power.is_president(candidate) {
        // A new officeholder starts a new impeachment round.
        next.polls.impeachment.clear();
        next.positions_of_power.president = Some(candidate.to_string());
    }

    Ok(finish(next, rules))
}

pub fn vote_to_impeach(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    vote: bool,
) -> Result<GameState, EngineError> {
    require_senator(state, voter)?;
    if state.polls.impeachment.contains_key(voter) {
        return Err(EngineError::DuplicateVote {
            voter: voter.to_string(),
            ballot: "impeachment".to_string(),
        });
    }
    let president = state
        .positions_of_power
        .president
        .clone()
        .ok_or_else(|| EngineError::State("there is no president to impeach".to_string()))?;

    let mut next = state.clone();
    next.polls.impeachment.insert(voter.to_string(), vote);

    let senators = &next.positions_of_power;
    let yes = next
        .polls
        .impeachment
        .iter()
        .filter(|(senator, ballot)| **ballot && senators.is_senator(senator))
        .count();
    let senate_size = senators.senators.len();
    let (num, den) = rules.impeachment_majority;
    let threshold = supermajority(senate_size, num, den);

    if yes >= threshold {
        info!(%president, yes, threshold, "president impeached");
        next.positions_of_power.president = None;
        next.polls.impeachment.clear();
        next.event_history.push(format!(
            "[IMPEACHMENT] President {} was removed from office by the senate ({} of {} senators)",
            president, yes, senate_size
        ));
    }

    Ok(finish(next, rules))
}

/// Seat the top candidates by cumulative senator tally.
///
/// Ties keep tally insertion order. Tallies are not cleared.
pub fn update_senators(state: &GameState, rules: &Rules) -> GameState {
    let mut next = state.clone();

    let mut ranked: Vec<(usize, &str, u64)> = state
        .polls
        .senator
        .iter()
        .enumerate()
        .map(|(idx, t)| (idx, t.candidate.as_str(), t.votes))
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

    next.positions_of_power.senators = ranked
        .into_iter()
        .take(rules.max_senators)
        .map(|(_, name, _)| name.to_string())
        .collect();

    info!(seats = next.positions_of_power.senators.len(), "senate updated");
    finish(next, rules)
}

// ---------------------------------------------------------------------------
// Citizen actions
// ---------------------------------------------------------------------------

/// Raise protest pressure. At or above the threshold every protest costs
/// welfare again.
pub fn protest(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    amount: u32,
    now: i64,
) -> Result<GameState, EngineError> {
    let last = state.last_action_times.get(voter).and_then(|t| t.protest);
    check_cooldown(last, now, rules.protest_cooldown_ms, "protest")?;

    let mut next = state.clone();
    action_times(&mut next, voter).protest = Some(now);

    let actions = &mut next.citizen_actions;
    actions.protest_percentage = add_percentage(actions.protest_percentage, amount, PERCENTAGE_CAP);
    if actions.protest_percentage >= rules.protest_threshold {
        next.statistics
            .adjust(Statistic::Welfare, -rules.protest_welfare_penalty);
    }

    Ok(finish(next, rules))
}

/// Raise coup support. Reaching the threshold resets the whole game.
pub fn join_coup(
    state: &GameState,
    rules: &Rules,
    voter: &str,
    amount: u32,
    now: i64,
) -> Result<GameState, EngineError> {
    let last = state.last_action_times.get(voter).and_then(|t| t.coup);
    check_cooldown(last, now, rules.coup_cooldown_ms, "join_coup")?;

    let mut next = state.clone();
    action_times(&mut next, voter).coup = Some(now);

    let actions = &mut next.citizen_actions;
    actions.coup_percentage = add_percentage(actions.coup_percentage, amount, PERCENTAGE_CAP);
    if actions.coup_percentage >= rules.coup_threshold {
        info!(coup = actions.coup_percentage, "coup succeeded, resetting");
        next = reset_state(&next, rules, COUP_NOTICE);
    }

    Ok(finish(next, rules))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Collapse check plus version bump. Every accepted transition ends here.
pub(crate) fn finish(mut state: GameState, rules: &Rules) -> GameState {
    if state.statistics.is_collapsed() {
        info!(version = state.version, "statistics collapsed, resetting");
        state = reset_state(&state, rules, COLLAPSE_NOTICE);
    }
    state.version += 1;
    state
}

pub(crate) fn check_cooldown(
    last: Option<i64>,
    now: i64,
    window: i64,
    action: &'static str,
) -> Result<(), EngineError> {
    match remaining_cooldown(last, now, window) {
        Some(remaining_ms) => Err(EngineError::RateLimit {
            action,
            remaining_ms,
        }),
        None => Ok(()),
    }
}

fn require_senator(state: &GameState, voter: &str) -> Result<(), EngineError> {
    if state.positions_of_power.is_senator(voter) {
        Ok(())
    } else {
        Err(EngineError::Permission {
            actor: voter.to_string(),
            required: "a senator",
        })
    }
}

fn require_president(state: &GameState, voter: &str) -> Result<(), EngineError> {
    if state.positions_of_power.is_president(voter) {
        Ok(())
    } else {
        Err(EngineError::Permission {
            actor: voter.to_string(),
            required: "the president",
        })
    }
}

fn action_times<'a>(state: &'a mut GameState, voter: &str) -> &'a mut ActionTimes {
    state
        .last_action_times
        .entry(voter.to_string())
        .or_default()
}
