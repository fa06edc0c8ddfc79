/// Civic kernel: Core Domain Types
///
/// Pure data plus small accessors. No transition logic.
/// Timestamps: Unix milliseconds (i64).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arithmetic::apply_delta;

// ── Statistics ─────────────────────────────────────────────────────

/// One of the six national-health metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Military,
    Economy,
    Healthcare,
    Welfare,
    Education,
    Technology,
}

impl Statistic {
    pub const ALL: [Statistic; 6] = [
        Statistic::Military,
        Statistic::Economy,
        Statistic::Healthcare,
        Statistic::Welfare,
        Statistic::Education,
        Statistic::Technology,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Military => "military",
            Statistic::Economy => "economy",
            Statistic::Healthcare => "healthcare",
            Statistic::Welfare => "welfare",
            Statistic::Education => "education",
            Statistic::Technology => "technology",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Statistic::ALL
            .into_iter()
            .find(|stat| stat.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown statistic {:?}", s))
    }
}

/// Signed per-statistic deltas.
pub type Effects = BTreeMap<Statistic, i64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Statistics {
    pub military: i64,
    pub economy: i64,
    pub healthcare: i64,
    pub welfare: i64,
    pub education: i64,
    pub technology: i64,
}

impl Statistics {
    pub fn uniform(value: i64) -> Self {
        Self {
            military: value,
            economy: value,
            healthcare: value,
            welfare: value,
            education: value,
            technology: value,
        }
    }

    pub fn get(&self, stat: Statistic) -> i64 {
        match stat {
            Statistic::Military => self.military,
            Statistic::Economy => self.economy,
            Statistic::Healthcare => self.healthcare,
            Statistic::Welfare => self.welfare,
            Statistic::Education => self.education,
            Statistic::Technology => self.technology,
        }
    }

    fn slot(&mut self, stat: Statistic) -> &mut i64 {
        match stat {
            Statistic::Military => &mut self.military,
            Statistic::Economy => &mut self.economy,
            Statistic::Healthcare => &mut self.healthcare,
            Statistic::Welfare => &mut self.welfare,
            Statistic::Education => &mut self.education,
            Statistic::Technology => &mut self.technology,
        }
    }

    /// Add `delta` to one statistic, clamping at zero.
    pub fn adjust(&mut self, stat: Statistic, delta: i64) {
        let slot = self.slot(stat);
        *slot = apply_delta(*slot, delta);
    }

    pub fn apply_effects(&mut self, effects: &Effects) {
        for (stat, delta) in effects {
            self.adjust(*stat, *delta);
        }
    }

    pub fn total(&self) -> i64 {
        Statistic::ALL
            .into_iter()
            .fold(0i64, |acc, stat| acc.saturating_add(self.get(stat)))
    }

    /// Integer mean of the six statistics.
    pub fn mean(&self) -> i64 {
        self.total() / Statistic::ALL.len() as i64
    }

    /// The mean is exactly zero. With non-negative values this means
    /// every statistic is zero.
    pub fn is_collapsed(&self) -> bool {
        self.total() == 0
    }
}

// ── Laws ───────────────────────────────────────────────────────────

/// Canonical law lifecycle: pending → awaiting_president → passed | vetoed.
///
/// `approved` / `rejected` are accepted on read as superseded spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LawStatus {
    Pending,
    AwaitingPresident,
    #[serde(alias = "approved")]
    Passed,
    #[serde(alias = "rejected")]
    Vetoed,
}

impl LawStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LawStatus::Pending => "pending",
            LawStatus::AwaitingPresident => "awaiting_president",
            LawStatus::Passed => "passed",
            LawStatus::Vetoed => "vetoed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Law {
    pub id: u64,
    pub text: String,
    pub votes_for: u32,
    pub votes_against: u32,
    pub status: LawStatus,
    pub created_at: i64,
    pub votes: BTreeMap<String, bool>,
}

// ── Polls ──────────────────────────────────────────────────────────

/// Cumulative votes for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tally {
    pub candidate: String,
    pub votes: u64,
}

/// Increment `candidate`'s tally, appending it on first vote so the
/// list keeps insertion order.
pub fn increment_tally(tallies: &mut Vec<Tally>, candidate: &str) {
    match tallies.iter_mut().find(|t| t.candidate == candidate) {
        Some(tally) => tally.votes = tally.votes.saturating_add(1),
        None => tallies.push(Tally {
            candidate: candidate.to_string(),
            votes: 1,
        }),
    }
}

pub fn tally_of(tallies: &[Tally], candidate: &str) -> u64 {
    tallies
        .iter()
        .find(|t| t.candidate == candidate)
        .map(|t| t.votes)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Polls {
    pub senator: Vec<Tally>,
    pub president: Vec<Tally>,
    /// Current impeachment round: senator → ballot.
    pub impeachment: BTreeMap<String, bool>,
}

// ── Citizens & offices ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CitizenActions {
    pub protest_percentage: u32,
    pub coup_percentage: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionsOfPower {
    /// Ranked by tally at the last senate update.
    pub senators: Vec<String>,
    pub president: Option<String>,
}

impl PositionsOfPower {
    pub fn is_senator(&self, username: &str) -> bool {
        self.senators.iter().any(|s| s == username)
    }

    pub fn is_president(&self, username: &str) -> bool {
        self.president.as_deref() == Some(username)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VotingRecords {
    pub senator: BTreeMap<String, i64>,
    pub president: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionTimes {
    pub protest: Option<i64>,
    pub coup: Option<i64>,
}

// ── Payloads ───────────────────────────────────────────────────────

/// A presidential decree applied directly to statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutiveOrder {
    pub description: String,
    #[serde(default)]
    pub effects: Effects,
}

/// One administrative audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditEntry {
    pub timestamp: i64,
    pub action: String,
    pub details: String,
}

// ── Game state ─────────────────────────────────────────────────────

/// The single global simulation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameState {
    pub version: u64,
    pub statistics: Statistics,
    pub event_history: Vec<String>,
    pub law_history: Vec<String>,
    pub laws: Vec<Law>,
    pub polls: Polls,
    pub citizen_actions: CitizenActions,
    pub positions_of_power: PositionsOfPower,
    pub voting_records: VotingRecords,
    pub last_action_times: BTreeMap<String, ActionTimes>,
    pub last_executive_order_time: i64,
}

impl GameState {
    pub fn law(&self, law_id: u64) -> Option<&Law> {
        self.laws.iter().find(|l| l.id == law_id)
    }

    pub fn law_mut(&mut self, law_id: u64) -> Option<&mut Law> {
        self.laws.iter_mut().find(|l| l.id == law_id)
    }
}
