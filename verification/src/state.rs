//! Lifecycle of one completion attempt.
//!
//! ```text
//! pending ──► verifying ──► completed
//!    │            │
//!    └────────────┴──► failed | rejected
//! ```

use crate::result::VerificationResult;
use crate::VerificationError;
use quest_types::{AttemptId, FailureCode, QuestId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptState {
    Pending,
    Verifying,
    Completed,
    Failed {
        code: FailureCode,
        #[serde(rename = "canRetry")]
        can_retry: bool,
        reason: String,
    },
    /// Administrative rejection.
    Rejected { reason: String },
}

impl AttemptState {
    pub fn kind(&self) -> AttemptStateKind {
        match self {
            Self::Pending => AttemptStateKind::Pending,
            Self::Verifying => AttemptStateKind::Verifying,
            Self::Completed => AttemptStateKind::Completed,
            Self::Failed { .. } => AttemptStateKind::Failed,
            Self::Rejected { .. } => AttemptStateKind::Rejected,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed { .. } | Self::Rejected { .. }
        )
    }
}

/// State without payload, for errors and metrics labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttemptStateKind {
    Pending,
    Verifying,
    Completed,
    Failed,
    Rejected,
}

impl AttemptStateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verifying => "verifying",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AttemptStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionAttempt {
    id: AttemptId,
    quest: QuestId,
    user: UserId,
    state: AttemptState,
    result: Option<VerificationResult>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl CompletionAttempt {
    pub fn new(id: AttemptId, quest: QuestId, user: UserId, now: Timestamp) -> Self {
        Self {
            id,
            quest,
            user,
            state: AttemptState::Pending,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `pending → verifying`.
    pub fn begin_verification(&mut self, now: Timestamp) -> Result<(), VerificationError> {
        self.transition(AttemptState::Verifying, &[AttemptStateKind::Pending], now)
    }

    /// Attach the orchestrator's final result. Only while verifying, once,
    /// and only after the result has passed or failed.
    pub fn attach_result(&mut self, result: VerificationResult) -> Result<(), VerificationError> {
        if self.state != AttemptState::Verifying {
            return Err(VerificationError::InvalidTransition {
                from: self.state.kind(),
                to: AttemptStateKind::Verifying,
            });
        }
        if self.result.is_some() {
            return Err(VerificationError::ResultAlreadyAttached);
        }
        if !result.is_final() {
            return Err(VerificationError::ResultNotFinal);
        }
        self.result = Some(result);
        Ok(())
    }

    /// `verifying → completed`. Requires an attached, passed result; the
    /// caller must already hold the completion claim.
    pub fn complete(&mut self, now: Timestamp) -> Result<(), VerificationError> {
        if !self.result.as_ref().is_some_and(|r| r.passed()) {
            return Err(VerificationError::ResultNotPassed);
        }
        self.transition(AttemptState::Completed, &[AttemptStateKind::Verifying], now)
    }

    /// `pending | verifying → failed`.
    pub fn fail(
        &mut self,
        code: FailureCode,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        let failed = AttemptState::Failed {
            code,
            can_retry: code.is_retryable(),
            reason: reason.into(),
        };
        self.transition(
            failed,
            &[AttemptStateKind::Pending, AttemptStateKind::Verifying],
            now,
        )
    }

    /// `pending | verifying → rejected`.
    pub fn reject(
        &mut self,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.transition(
            AttemptState::Rejected {
                reason: reason.into(),
            },
            &[AttemptStateKind::Pending, AttemptStateKind::Verifying],
            now,
        )
    }

    fn transition(
        &mut self,
        to: AttemptState,
        allowed_from: &[AttemptStateKind],
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        let from = self.state.kind();
        if !allowed_from.contains(&from) {
            return Err(VerificationError::InvalidTransition {
                from,
                to: to.kind(),
            });
        }
        self.state = to;
        self.updated_at = now;
        Ok(())
    }

    pub fn id(&self) -> &AttemptId {
        &self.id
    }

    pub fn quest(&self) -> &QuestId {
        &self.quest
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn result(&self) -> Option<&VerificationResult> {
        self.result.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn failure_code(&self) -> Option<FailureCode> {
        match &self.state {
            AttemptState::Failed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether a new attempt may follow this one. Only meaningful once failed.
    pub fn can_retry(&self) -> bool {
        matches!(self.state, AttemptState::Failed { can_retry: true, .. })
    }
}
