//! Row types as stored in SQLite

use chrono::{DateTime, Utc};
use roster_core::models::{PrStatus, PullRequest, User};
use roster_core::store::{StoreError, StoreResult};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
    pub team_name: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            username: row.username,
            is_active: row.is_active,
            team_name: row.team_name,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PullRequestRow {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequestRow {
    /// Attach the reviewer ids loaded separately from `pr_reviewers`
    pub fn into_pull_request(self, assigned_reviewers: Vec<String>) -> StoreResult<PullRequest> {
        let status: PrStatus = self.status.parse().map_err(StoreError::Backend)?;
        Ok(PullRequest {
            id: self.id,
            name: self.name,
            author_id: self.author_id,
            status,
            assigned_reviewers,
            created_at: self.created_at,
            merged_at: self.merged_at,
        })
    }
}
