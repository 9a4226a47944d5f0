//! Pull request operations: creation, reviewer assignment, merge.
//!
//! Each public method opens one store transaction, applies the rules from
//! [`crate::assignment`] and [`crate::lifecycle`], and commits only when all
//! of them pass. An early return drops the transaction, which rolls back.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::assignment;
use crate::error::{Entity, Error, Result};
use crate::lifecycle::{self, MergePlan};
use crate::models::{NewPullRequest, PrStatus, PullRequest, User};
use crate::store::{Constraint, Store, StoreError, StoreTx};

/// Reviewer assignment and lifecycle operations on pull requests
#[derive(Clone)]
pub struct PullRequestService {
    store: Arc<dyn Store>,
}

async fn load_pr(tx: &mut dyn StoreTx, pr_id: &str) -> Result<PullRequest> {
    tx.pull_request(pr_id)
        .await?
        .ok_or_else(|| Error::pr_not_found(pr_id))
}

async fn load_user(tx: &mut dyn StoreTx, user_id: &str) -> Result<User> {
    tx.user(user_id)
        .await?
        .ok_or_else(|| Error::user_not_found(user_id))
}

/// Auto-assign inside an existing transaction
async fn auto_assign(tx: &mut dyn StoreTx, pr_id: &str) -> Result<PullRequest> {
    let mut pr = load_pr(tx, pr_id).await?;
    lifecycle::ensure_modifiable(&pr)?;

    let author = match tx.user(&pr.author_id).await? {
        Some(author) => author,
        None => {
            tracing::error!(pr_id, author_id = %pr.author_id, "Pull request author missing from store");
            return Err(Error::user_not_found(&pr.author_id));
        }
    };

    let members = tx.team_members(&author.team_name).await?;
    let reviewers = assignment::pick_auto_reviewers(&author, &members);
    tx.replace_reviewers(pr_id, &reviewers).await?;

    tracing::info!(
        pr_id,
        team = %author.team_name,
        reviewers = ?reviewers,
        "Assigned reviewers"
    );

    pr.assigned_reviewers = reviewers;
    Ok(pr)
}

impl PullRequestService {
    /// Create a service backed by `store`
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Get a pull request with its reviewers
    pub async fn get_pr(&self, pr_id: &str) -> Result<PullRequest> {
        let mut tx = self.store.begin().await?;
        load_pr(tx.as_mut(), pr_id).await
    }

    /// Replace the reviewer set with the first active teammates of the author
    pub async fn auto_assign_reviewers(&self, pr_id: &str) -> Result<PullRequest> {
        let mut tx = self.store.begin().await?;
        let pr = auto_assign(tx.as_mut(), pr_id).await?;
        tx.commit().await?;
        Ok(pr)
    }

    /// Create an OPEN pull request and auto-assign its reviewers.
    ///
    /// The author may be inactive. An id collision is reported by the store's
    /// primary key constraint and becomes `Conflict`.
    pub async fn create_pr_with_auto_reviewers(
        &self,
        id: &str,
        name: &str,
        author_id: &str,
    ) -> Result<PullRequest> {
        let mut tx = self.store.begin().await?;
        load_user(tx.as_mut(), author_id).await?;

        let new_pr = NewPullRequest::new(id, name, author_id);
        tx.insert_pull_request(&new_pr)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(Constraint::PullRequestId) => {
                    tracing::debug!(pr_id = id, "Pull request id already taken");
                    Error::Conflict(Entity::PullRequest(id.to_string()))
                }
                other => Error::Store(other),
            })?;
        tracing::info!(pr_id = id, author_id, "Created pull request");

        let pr = auto_assign(tx.as_mut(), id).await?;
        tx.commit().await?;
        Ok(pr)
    }

    /// Swap one assigned reviewer for another teammate of the author
    pub async fn replace_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<PullRequest> {
        let mut tx = self.store.begin().await?;
        let mut pr = load_pr(tx.as_mut(), pr_id).await?;
        lifecycle::ensure_modifiable(&pr)?;

        let old = load_user(tx.as_mut(), old_reviewer_id).await?;
        let new = load_user(tx.as_mut(), new_reviewer_id).await?;
        let author = load_user(tx.as_mut(), &pr.author_id).await?;

        let reviewers = assignment::replace_reviewer(&pr, &author, &old, &new)?;
        tx.replace_reviewers(pr_id, &reviewers).await?;
        tx.commit().await?;

        tracing::info!(
            pr_id,
            old_reviewer_id,
            new_reviewer_id,
            "Replaced reviewer"
        );

        pr.assigned_reviewers = reviewers;
        Ok(pr)
    }

    /// Replace the whole reviewer set with `reviewer_ids`
    pub async fn set_reviewers(&self, pr_id: &str, reviewer_ids: &[String]) -> Result<PullRequest> {
        assignment::ensure_reviewer_count(reviewer_ids)?;

        let mut tx = self.store.begin().await?;
        let mut pr = load_pr(tx.as_mut(), pr_id).await?;
        lifecycle::ensure_modifiable(&pr)?;

        let author = load_user(tx.as_mut(), &pr.author_id).await?;
        let mut found = HashMap::new();
        for user_id in reviewer_ids {
            if let Some(user) = tx.user(user_id).await? {
                found.insert(user_id.clone(), user);
            }
        }

        let reviewers = assignment::validate_reviewer_set(&pr, &author, reviewer_ids, &found)?;
        tx.replace_reviewers(pr_id, &reviewers).await?;
        tx.commit().await?;

        tracing::info!(pr_id, reviewers = ?reviewers, "Set reviewers");

        pr.assigned_reviewers = reviewers;
        Ok(pr)
    }

    /// Mark a pull request MERGED. Merging twice returns the stored record.
    pub async fn merge_pr(&self, pr_id: &str) -> Result<PullRequest> {
        let mut tx = self.store.begin().await?;
        let pr = load_pr(tx.as_mut(), pr_id).await?;

        match lifecycle::plan_merge(&pr, Utc::now()) {
            MergePlan::AlreadyMerged => {
                tracing::debug!(pr_id, "Pull request already merged");
                Ok(pr)
            }
            MergePlan::Merge { merged_at } => {
                let merged = tx
                    .update_pull_request_status(pr_id, PrStatus::Merged, Some(merged_at))
                    .await?
                    .ok_or_else(|| Error::pr_not_found(pr_id))?;
                tx.commit().await?;

                tracing::info!(
                    pr_id,
                    from = %pr.status,
                    to = %merged.status,
                    "Pull request status transition"
                );
                Ok(merged)
            }
        }
    }
}
