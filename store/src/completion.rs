//! Completion counter storage trait.

use crate::{AdmissionDenial, StoreError};
use chrono::NaiveDate;
use quest_types::{CompletionLimits, QuestId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Per-quest totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestCounters {
    pub total_completions: u32,
    pub rewards_committed: u64,
}

impl QuestCounters {
    /// Budget left under `budget`, if the quest has one.
    pub fn remaining_budget(&self, budget: Option<u64>) -> Option<u64> {
        budget.map(|b| b.saturating_sub(self.rewards_committed))
    }
}

/// Per-(quest, user) totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounters {
    pub completions: u32,
    /// Completions on the claim's day, in the quest's timezone.
    pub completions_today: u32,
}

/// A request to record one completion, carrying the limits to enforce.
#[derive(Clone, Debug)]
pub struct CompletionClaim {
    pub quest: QuestId,
    pub user: UserId,
    /// Calendar day in the quest's timezone, for the daily limit.
    pub day: NaiveDate,
    pub limits: CompletionLimits,
    pub claimed_at: Timestamp,
}

/// Result of an atomic claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The completion was recorded; counters after the increment.
    Recorded(QuestCounters),
    /// A limit was hit; nothing was written.
    Denied(AdmissionDenial),
}

/// Trait for storing completion counters.
pub trait CompletionStore: Send + Sync {
    /// Current totals for a quest. Unknown quests have zero counters.
    fn quest_counters(&self, quest: &QuestId) -> Result<QuestCounters, StoreError>;

    /// Current totals for one user on a quest, with `day` selecting the daily bucket.
    fn user_counters(
        &self,
        quest: &QuestId,
        user: &UserId,
        day: NaiveDate,
    ) -> Result<UserCounters, StoreError>;

    /// Re-check `claim.limits` against the stored counters and, if admitted,
    /// increment them, all as one atomic step. Two concurrent claims must
    /// never both observe the same pre-increment counters.
    fn try_claim(&self, claim: &CompletionClaim) -> Result<ClaimOutcome, StoreError>;
}
