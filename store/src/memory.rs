//! In-process completion store.

use crate::admission::check_limits;
use crate::{ClaimOutcome, CompletionClaim, CompletionStore, QuestCounters, StoreError, UserCounters};
use chrono::NaiveDate;
use quest_types::{QuestId, UserId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Counters {
    quests: HashMap<QuestId, QuestCounters>,
    users: HashMap<(QuestId, UserId), u32>,
    daily: HashMap<(QuestId, UserId, NaiveDate), u32>,
}

impl Counters {
    fn user(&self, quest: &QuestId, user: &UserId, day: NaiveDate) -> UserCounters {
        let key = (quest.clone(), user.clone());
        UserCounters {
            completions: self.users.get(&key).copied().unwrap_or(0),
            completions_today: self
                .daily
                .get(&(key.0, key.1, day))
                .copied()
                .unwrap_or(0),
        }
    }
}

/// Counters behind one mutex. A claim holds the lock across the re-check and
/// the increment, so concurrent claims are serialized.
#[derive(Default)]
pub struct MemoryCompletionStore {
    inner: Mutex<Counters>,
}

impl MemoryCompletionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Counters>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("completion counters lock poisoned".into()))
    }
}

impl CompletionStore for MemoryCompletionStore {
    fn quest_counters(&self, quest: &QuestId) -> Result<QuestCounters, StoreError> {
        Ok(self.lock()?.quests.get(quest).copied().unwrap_or_default())
    }

    fn user_counters(
        &self,
        quest: &QuestId,
        user: &UserId,
        day: NaiveDate,
    ) -> Result<UserCounters, StoreError> {
        Ok(self.lock()?.user(quest, user, day))
    }

    fn try_claim(&self, claim: &CompletionClaim) -> Result<ClaimOutcome, StoreError> {
        let mut counters = self.lock()?;

        let quest = counters.quests.get(&claim.quest).copied().unwrap_or_default();
        let user = counters.user(&claim.quest, &claim.user, claim.day);
        if let Some(denial) = check_limits(&claim.limits, &quest, &user) {
            return Ok(ClaimOutcome::Denied(denial));
        }

        let updated = QuestCounters {
            total_completions: quest.total_completions.saturating_add(1),
            rewards_committed: quest
                .rewards_committed
                .saturating_add(claim.limits.reward_per_completion),
        };
        counters.quests.insert(claim.quest.clone(), updated);
        let total = counters
            .users
            .entry((claim.quest.clone(), claim.user.clone()))
            .or_default();
        *total = total.saturating_add(1);
        let today = counters
            .daily
            .entry((claim.quest.clone(), claim.user.clone(), claim.day))
            .or_default();
        *today = today.saturating_add(1);

        Ok(ClaimOutcome::Recorded(updated))
    }
}
