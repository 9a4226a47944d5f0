//! Entity store abstraction.
//!
//! The services in this crate never talk to a database directly. They open a
//! transaction through [`Store::begin`], read and write through [`StoreTx`],
//! and call [`StoreTx::commit`] once every rule has passed. Dropping a
//! transaction without committing discards all of its writes.
//!
//! Implementations must report unique-key collisions as
//! [`StoreError::UniqueViolation`] naming the [`Constraint`] that fired, so
//! callers can tell a pull request id collision from any other.

mod memory;

pub use memory::InMemoryStore;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{NewPullRequest, PrStatus, PullRequest, Team, User};

/// Unique constraints known to the domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Team primary key
    TeamName,
    /// User primary key
    UserId,
    /// Pull request primary key
    PullRequestId,
    /// One row per (pull request, reviewer)
    ReviewerAssignment,
    /// Anything the backend reported that we do not recognise
    Other(String),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::TeamName => f.write_str("teams.name"),
            Constraint::UserId => f.write_str("users.user_id"),
            Constraint::PullRequestId => f.write_str("pull_requests.id"),
            Constraint::ReviewerAssignment => f.write_str("pr_reviewers.pr_id, pr_reviewers.user_id"),
            Constraint::Other(name) => f.write_str(name),
        }
    }
}

/// Storage failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(Constraint),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("{0}")]
    Backend(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Handle to a transactional entity store
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new transaction
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Operations available inside one transaction
#[async_trait]
pub trait StoreTx: Send {
    /// Look up a team by name
    async fn team(&mut self, name: &str) -> StoreResult<Option<Team>>;

    /// Insert a team; fails with `UniqueViolation(TeamName)` when taken
    async fn insert_team(&mut self, name: &str) -> StoreResult<Team>;

    /// Look up a user by id
    async fn user(&mut self, user_id: &str) -> StoreResult<Option<User>>;

    /// Insert or update a user keyed by `user_id`
    async fn upsert_user(&mut self, user: &User) -> StoreResult<User>;

    /// All users of a team, ascending by `user_id`
    async fn team_members(&mut self, team_name: &str) -> StoreResult<Vec<User>>;

    /// Set `is_active` and return the updated user, or `None` if unknown
    async fn update_user_active(
        &mut self,
        user_id: &str,
        is_active: bool,
    ) -> StoreResult<Option<User>>;

    /// Look up a pull request with its reviewers
    async fn pull_request(&mut self, id: &str) -> StoreResult<Option<PullRequest>>;

    /// Insert an OPEN pull request with no reviewers
    async fn insert_pull_request(&mut self, pr: &NewPullRequest) -> StoreResult<PullRequest>;

    /// Update status and merge time, returning the stored record
    async fn update_pull_request_status(
        &mut self,
        id: &str,
        status: PrStatus,
        merged_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<PullRequest>>;

    /// Replace the full reviewer set of a pull request
    async fn replace_reviewers(&mut self, pr_id: &str, reviewer_ids: &[String])
        -> StoreResult<()>;

    /// Pull requests on which `user_id` is an assigned reviewer
    async fn pull_requests_for_reviewer(&mut self, user_id: &str)
        -> StoreResult<Vec<PullRequest>>;

    /// Make every write of this transaction visible
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
