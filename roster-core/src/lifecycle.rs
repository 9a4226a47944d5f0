//! Pull request lifecycle
//!
//! A pull request starts OPEN and may move to MERGED exactly once. MERGED is
//! terminal, and reviewer changes are only allowed while OPEN.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::{PrStatus, PullRequest};

impl PrStatus {
    /// Status given to every new pull request
    pub fn initial() -> Self {
        PrStatus::Open
    }

    /// Check if a transition to `next` is valid
    pub fn can_transition_to(&self, next: PrStatus) -> bool {
        matches!((self, next), (PrStatus::Open, PrStatus::Merged))
    }

    /// Valid transitions from this status
    pub fn valid_transitions(&self) -> Vec<PrStatus> {
        [PrStatus::Open, PrStatus::Merged]
            .into_iter()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }

    /// Check if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Whether the reviewer set may still change
    pub fn allows_reviewer_changes(&self) -> bool {
        !self.is_terminal()
    }
}

/// Fail with `InvalidState` unless the pull request accepts reviewer changes
pub fn ensure_modifiable(pr: &PullRequest) -> Result<()> {
    if pr.status.allows_reviewer_changes() {
        Ok(())
    } else {
        tracing::debug!(pr_id = %pr.id, status = %pr.status, "Rejected reviewer change");
        Err(Error::InvalidState {
            pr_id: pr.id.clone(),
        })
    }
}

/// What a merge request should do to the stored record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePlan {
    /// Write status MERGED with this merge time
    Merge { merged_at: DateTime<Utc> },
    /// Already merged; return the record untouched
    AlreadyMerged,
}

/// Decide how to merge `pr` at time `now`
pub fn plan_merge(pr: &PullRequest, now: DateTime<Utc>) -> MergePlan {
    if pr.status.can_transition_to(PrStatus::Merged) {
        MergePlan::Merge { merged_at: now }
    } else {
        MergePlan::AlreadyMerged
    }
}
