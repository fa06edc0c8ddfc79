/// Civic kernel: Administrative Transitions
///
/// Gated by the injected `RolePolicy`. Each accepted call returns the new
/// state and the audit record the caller must append to the audit log.

use crate::config::{RolePolicy, Rules};
use crate::domain::{AuditEntry, GameState, LawStatus, Statistic};
use crate::error::EngineError;
use crate::transitions::finish;

fn require_admin(policy: &RolePolicy, actor: &str) -> Result<(), EngineError> {
    if policy.is_admin(actor) {
        Ok(())
    } else {
        Err(EngineError::Permission {
            actor: actor.to_string(),
            required: "an administrator",
        })
    }
}

fn audit(now: i64, action: &str, details: String) -> AuditEntry {
    AuditEntry {
        timestamp: now,
        action: action.to_string(),
        details,
    }
}

/// Manually shift one statistic. Clamped at zero; may trigger collapse.
pub fn adjust_statistic(
    state: &GameState,
    rules: &Rules,
    policy: &RolePolicy,
    actor: &str,
    statistic: Statistic,
    delta: i64,
    now: i64,
) -> Result<(GameState, AuditEntry), EngineError> {
    require_admin(policy, actor)?;

    let mut next = state.clone();
    let before = next.statistics.get(statistic);
    next.statistics.adjust(statistic, delta);
    let after = next.statistics.get(statistic);

    let entry = audit(
        now,
        "adjust_statistic",
        format!("{} adjusted {} by {} ({} -> {})", actor, statistic, delta, before, after),
    );
    Ok((finish(next, rules), entry))
}

/// Force an undecided law to `passed`, bypassing senate and president.
pub fn approve_law(
    state: &GameState,
    rules: &Rules,
    policy: &RolePolicy,
    actor: &str,
    law_id: u64,
    now: i64,
) -> Result<(GameState, AuditEntry), EngineError> {
    require_admin(policy, actor)?;

    let law = state.law(law_id).ok_or(EngineError::NotFound { law_id })?;
    if matches!(law.status, LawStatus::Passed | LawStatus::Vetoed) {
        return Err(EngineError::State(format!(
            "law {} is already {}",
            law_id,
            law.status.as_str()
        )));
    }

    let mut next = state.clone();
    let law = next.law_mut(law_id).ok_or(EngineError::NotFound { law_id })?;
    law.status = LawStatus::Passed;
    let summary = format!(
        "Law #{} \"{}\" passed by administrator {}",
        law.id, law.text, actor
    );
    next.law_history.push(summary.clone());

    Ok((finish(next, rules), audit(now, "approve_law", summary)))
}

/// Drop a user's vote timestamps and citizen-action cooldowns.
pub fn clear_user_records(
    state: &GameState,
    rules: &Rules,
    policy: &RolePolicy,
    actor: &str,
    username: &str,
    now: i64,
) -> Result<(GameState, AuditEntry), EngineError> {
    require_admin(policy, actor)?;

    let mut next = state.clone();
    let senator = next.voting_records.senator.remove(username).is_some();
    let president = next.voting_records.president.remove(username).is_some();
    let actions = next.last_action_times.remove(username).is_some();

    let entry = audit(
        now,
        "clear_user_records",
        format!(
            "{} cleared records of {} (senator vote: {}, president vote: {}, actions: {})",
            actor, username, senator, president, actions
        ),
    );
    Ok((finish(next, rules), entry))
}
