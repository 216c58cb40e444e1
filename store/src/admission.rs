//! Limit checks shared by the advisory pre-check and the atomic claim.

use crate::{QuestCounters, UserCounters};
use quest_types::{CompletionLimits, FailureCode};
use serde::{Deserialize, Serialize};

/// Why a completion may not be recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDenial {
    pub code: FailureCode,
    pub reason: String,
}

impl AdmissionDenial {
    pub fn new(code: FailureCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// Check counter-based limits. Quest activity and expiry are checked by the
/// caller, which owns the clock.
///
/// Quest-wide limits are checked before per-user limits so an exhausted
/// quest reports `BUDGET_EXHAUSTED` to everyone.
pub fn check_limits(
    limits: &CompletionLimits,
    quest: &QuestCounters,
    user: &UserCounters,
) -> Option<AdmissionDenial> {
    if let Some(max) = limits.max_completions {
        if quest.total_completions >= max {
            return Some(AdmissionDenial::new(
                FailureCode::BudgetExhausted,
                format!("quest has reached its maximum of {max} completions"),
            ));
        }
    }

    if let Some(remaining) = quest.remaining_budget(limits.reward_budget) {
        if remaining < limits.reward_per_completion {
            return Some(AdmissionDenial::new(
                FailureCode::BudgetExhausted,
                format!(
                    "reward budget exhausted: {remaining} remaining, {} needed",
                    limits.reward_per_completion
                ),
            ));
        }
    }

    if user.completions >= limits.max_per_user {
        return Some(AdmissionDenial::new(
            FailureCode::AlreadyCompleted,
            "you have already completed this quest",
        ));
    }

    if let Some(daily) = limits.daily_limit_per_user {
        if user.completions_today >= daily {
            return Some(AdmissionDenial::new(
                FailureCode::AlreadyCompleted,
                format!("daily limit of {daily} completions reached"),
            ));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> CompletionLimits {
        CompletionLimits {
            max_completions: Some(3),
            max_per_user: 2,
            daily_limit_per_user: Some(1),
            reward_per_completion: 100,
            reward_budget: Some(250),
            ..CompletionLimits::default()
        }
    }

    #[test]
    fn fresh_counters_are_admitted() {
        let denial = check_limits(&limits(), &QuestCounters::default(), &UserCounters::default());
        assert!(denial.is_none());
    }

    #[test]
    fn max_completions_exhausts_budget() {
        let quest = QuestCounters {
            total_completions: 3,
            rewards_committed: 0,
        };
        let denial = check_limits(&limits(), &quest, &UserCounters::default()).unwrap();
        assert_eq!(denial.code, FailureCode::BudgetExhausted);
    }

    #[test]
    fn insufficient_reward_budget() {
        let quest = QuestCounters {
            total_completions: 2,
            rewards_committed: 200,
        };
        let denial = check_limits(&limits(), &quest, &UserCounters::default()).unwrap();
        assert_eq!(denial.code, FailureCode::BudgetExhausted);
        assert!(denial.reason.contains("50 remaining"));
    }

    #[test]
    fn per_user_cap() {
        let user = UserCounters {
            completions: 2,
            completions_today: 0,
        };
        let denial = check_limits(&limits(), &QuestCounters::default(), &user).unwrap();
        assert_eq!(denial.code, FailureCode::AlreadyCompleted);
    }

    #[test]
    fn daily_cap() {
        let user = UserCounters {
            completions: 1,
            completions_today: 1,
        };
        let denial = check_limits(&limits(), &QuestCounters::default(), &user).unwrap();
        assert_eq!(denial.code, FailureCode::AlreadyCompleted);
        assert!(denial.reason.contains("daily"));
    }

    #[test]
    fn unlimited_quest_only_applies_user_cap() {
        let quest = QuestCounters {
            total_completions: 1_000_000,
            rewards_committed: u64::MAX,
        };
        let denial = check_limits(&CompletionLimits::default(), &quest, &UserCounters::default());
        assert!(denial.is_none());
    }
}
