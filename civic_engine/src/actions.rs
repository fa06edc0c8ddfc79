/// Civic kernel: Caller Actions
///
/// Actions are pure data: intent plus payload. They carry no logic.
/// The acting username travels separately, supplied by the host.

use serde::{Deserialize, Serialize};

use crate::domain::{ExecutiveOrder, Statistic};

/// One caller-facing request against the game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    DraftLaw { text: String },
    VoteOnLaw { law_id: u64, vote: bool },
    PassLaw { law_id: u64 },
    VetoLaw { law_id: u64 },
    ExecutiveOrder { order: ExecutiveOrder },
    VoteSenator { candidate: String },
    VotePresident { candidate: String },
    VoteToImpeach { vote: bool },
    Protest { amount: u32 },
    JoinCoup { amount: u32 },
    AdjustStatistic { statistic: Statistic, delta: i64 },
    ApproveLaw { law_id: u64 },
    ClearUserRecords { username: String },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::DraftLaw { .. } => "draft_law",
            Action::VoteOnLaw { .. } => "vote_on_law",
            Action::PassLaw { .. } => "pass_law",
            Action::VetoLaw { .. } => "veto_law",
            Action::ExecutiveOrder { .. } => "executive_order",
            Action::VoteSenator { .. } => "vote_senator",
            Action::VotePresident { .. } => "vote_president",
            Action::VoteToImpeach { .. } => "vote_to_impeach",
            Action::Protest { .. } => "protest",
            Action::JoinCoup { .. } => "join_coup",
            Action::AdjustStatistic { .. } => "adjust_statistic",
            Action::ApproveLaw { .. } => "approve_law",
            Action::ClearUserRecords { .. } => "clear_user_records",
        }
    }

    /// Administrative actions produce an audit entry.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Action::AdjustStatistic { .. }
                | Action::ApproveLaw { .. }
                | Action::ClearUserRecords { .. }
        )
    }
}
