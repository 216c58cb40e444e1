//! Nullable completion store: in-memory counters with failure injection.

use chrono::NaiveDate;
use quest_store::{
    ClaimOutcome, CompletionClaim, CompletionStore, MemoryCompletionStore, QuestCounters,
    StoreError, UserCounters,
};
use quest_types::{QuestId, UserId};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Thread-safe in-memory store for tests. Can be switched offline to
/// exercise backend-error paths, and counts claim calls.
#[derive(Default)]
pub struct NullCompletionStore {
    inner: MemoryCompletionStore,
    offline: AtomicBool,
    claim_calls: AtomicU32,
}

impl NullCompletionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a backend error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `try_claim` calls so far.
    pub fn claim_calls(&self) -> u32 {
        self.claim_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store is offline".into()));
        }
        Ok(())
    }
}

impl CompletionStore for NullCompletionStore {
    fn quest_counters(&self, quest: &QuestId) -> Result<QuestCounters, StoreError> {
        self.check_online()?;
        self.inner.quest_counters(quest)
    }

    fn user_counters(
        &self,
        quest: &QuestId,
        user: &UserId,
        day: NaiveDate,
    ) -> Result<UserCounters, StoreError> {
        self.check_online()?;
        self.inner.user_counters(quest, user, day)
    }

    fn try_claim(&self, claim: &CompletionClaim) -> Result<ClaimOutcome, StoreError> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.inner.try_claim(claim)
    }
}
