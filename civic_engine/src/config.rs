/// Civic kernel: Rules & Role Policy
///
/// Every cooldown, threshold and majority is a named constant and an
/// overridable field of `Rules`. Identity policy lives in `RolePolicy`
/// and is injected by the caller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::arithmetic::{DAY_MS, MINUTE_MS};

pub const PROTEST_COOLDOWN_MS: i64 = 5 * MINUTE_MS;
pub const COUP_COOLDOWN_MS: i64 = 5 * MINUTE_MS;
pub const SENATOR_VOTE_COOLDOWN_MS: i64 = 14 * DAY_MS;
pub const PRESIDENT_VOTE_COOLDOWN_MS: i64 = 30 * DAY_MS;
pub const EXECUTIVE_ORDER_COOLDOWN_MS: i64 = 7 * DAY_MS;

pub const PROTEST_THRESHOLD: u32 = 30;
pub const COUP_THRESHOLD: u32 = 70;
pub const PERCENTAGE_CAP: u32 = 100;
pub const PROTEST_WELFARE_PENALTY: i64 = 10;

/// Law passage: `votes_for >= ⌈2/3 · senators⌉`.
pub const LAW_MAJORITY: (u32, u32) = (2, 3);
/// Impeachment: `yes ballots >= ⌈3/4 · senators⌉`.
pub const IMPEACHMENT_MAJORITY: (u32, u32) = (3, 4);

pub const MAX_SENATORS: usize = 40;
pub const BASELINE_STATISTIC: i64 = 100;

/// Tier weights in percent: minor, major, crisis. Must sum to 100.
pub const TIER_WEIGHTS: [u32; 3] = [70, 25, 5];

/// Scaling applied per relevant law, in percent.
pub const RELEVANT_NEGATIVE_SCALE: i64 = 80;
pub const RELEVANT_POSITIVE_SCALE: i64 = 110;

/// Whether random events consult the oracle about law relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceMode {
    #[default]
    Disabled,
    PerLaw,
}

/// Load-bearing business rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    pub protest_cooldown_ms: i64,
    pub coup_cooldown_ms: i64,
    pub senator_vote_cooldown_ms: i64,
    pub president_vote_cooldown_ms: i64,
    pub executive_order_cooldown_ms: i64,
    pub protest_threshold: u32,
    pub coup_threshold: u32,
    pub protest_welfare_penalty: i64,
    pub law_majority: (u32, u32),
    pub impeachment_majority: (u32, u32),
    pub max_senators: usize,
    pub baseline_statistic: i64,
    pub tier_weights: [u32; 3],
    pub relevant_negative_scale: i64,
    pub relevant_positive_scale: i64,
    pub relevance_mode: RelevanceMode,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            protest_cooldown_ms: PROTEST_COOLDOWN_MS,
            coup_cooldown_ms: COUP_COOLDOWN_MS,
            senator_vote_cooldown_ms: SENATOR_VOTE_COOLDOWN_MS,
            president_vote_cooldown_ms: PRESIDENT_VOTE_COOLDOWN_MS,
            executive_order_cooldown_ms: EXECUTIVE_ORDER_COOLDOWN_MS,
            protest_threshold: PROTEST_THRESHOLD,
            coup_threshold: COUP_THRESHOLD,
            protest_welfare_penalty: PROTEST_WELFARE_PENALTY,
            law_majority: LAW_MAJORITY,
            impeachment_majority: IMPEACHMENT_MAJORITY,
            max_senators: MAX_SENATORS,
            baseline_statistic: BASELINE_STATISTIC,
            tier_weights: TIER_WEIGHTS,
            relevant_negative_scale: RELEVANT_NEGATIVE_SCALE,
            relevant_positive_scale: RELEVANT_POSITIVE_SCALE,
            relevance_mode: RelevanceMode::Disabled,
        }
    }
}

/// Explicit role assignment for administrative actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolePolicy {
    pub admins: BTreeSet<String>,
}

impl RolePolicy {
    pub fn with_admins<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admins.contains(username)
    }
}
