//! In-memory implementation of `Store`.
//!
//! All state is lost on restart. A transaction holds the store lock for its
//! whole life and works on a private copy of the tables, which replaces the
//! shared copy on commit. Transactions are therefore fully serialised.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Constraint, Store, StoreError, StoreResult, StoreTx};
use crate::models::{NewPullRequest, PrStatus, PullRequest, Team, User};

#[derive(Debug, Clone, Default)]
struct Tables {
    teams: BTreeMap<String, Team>,
    users: BTreeMap<String, User>,
    /// Pull requests without reviewers; see `reviewers`
    pull_requests: BTreeMap<String, PullRequest>,
    /// (pr_id, user_id)
    reviewers: BTreeSet<(String, String)>,
}

impl Tables {
    fn with_reviewers(&self, pr: &PullRequest) -> PullRequest {
        let mut pr = pr.clone();
        pr.assigned_reviewers = self
            .reviewers
            .iter()
            .filter(|(pr_id, _)| *pr_id == pr.id)
            .map(|(_, user_id)| user_id.clone())
            .collect();
        pr
    }
}

/// In-memory entity store
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn team(&mut self, name: &str) -> StoreResult<Option<Team>> {
        Ok(self.working.teams.get(name).cloned())
    }

    async fn insert_team(&mut self, name: &str) -> StoreResult<Team> {
        if self.working.teams.contains_key(name) {
            return Err(StoreError::UniqueViolation(Constraint::TeamName));
        }
        let team = Team {
            name: name.to_string(),
        };
        self.working.teams.insert(name.to_string(), team.clone());
        Ok(team)
    }

    async fn user(&mut self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.working.users.get(user_id).cloned())
    }

    async fn upsert_user(&mut self, user: &User) -> StoreResult<User> {
        if !self.working.teams.contains_key(&user.team_name) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "users.team_name references unknown team {}",
                user.team_name
            )));
        }
        self.working
            .users
            .insert(user.user_id.clone(), user.clone());
        Ok(user.clone())
    }

    async fn team_members(&mut self, team_name: &str) -> StoreResult<Vec<User>> {
        Ok(self
            .working
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .cloned()
            .collect())
    }

    async fn update_user_active(
        &mut self,
        user_id: &str,
        is_active: bool,
    ) -> StoreResult<Option<User>> {
        Ok(self.working.users.get_mut(user_id).map(|user| {
            user.is_active = is_active;
            user.clone()
        }))
    }

    async fn pull_request(&mut self, id: &str) -> StoreResult<Option<PullRequest>> {
        Ok(self
            .working
            .pull_requests
            .get(id)
            .map(|pr| self.working.with_reviewers(pr)))
    }

    async fn insert_pull_request(&mut self, pr: &NewPullRequest) -> StoreResult<PullRequest> {
        if self.working.pull_requests.contains_key(&pr.id) {
            return Err(StoreError::UniqueViolation(Constraint::PullRequestId));
        }
        if !self.working.users.contains_key(&pr.author_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "pull_requests.author_id references unknown user {}",
                pr.author_id
            )));
        }
        let record = PullRequest {
            id: pr.id.clone(),
            name: pr.name.clone(),
            author_id: pr.author_id.clone(),
            status: PrStatus::initial(),
            assigned_reviewers: Vec::new(),
            created_at: pr.created_at,
            merged_at: None,
        };
        self.working
            .pull_requests
            .insert(pr.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_pull_request_status(
        &mut self,
        id: &str,
        status: PrStatus,
        merged_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<PullRequest>> {
        let Some(pr) = self.working.pull_requests.get_mut(id) else {
            return Ok(None);
        };
        pr.status = status;
        pr.merged_at = merged_at;
        let pr = pr.clone();
        Ok(Some(self.working.with_reviewers(&pr)))
    }

    async fn replace_reviewers(
        &mut self,
        pr_id: &str,
        reviewer_ids: &[String],
    ) -> StoreResult<()> {
        if !self.working.pull_requests.contains_key(pr_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "pr_reviewers.pr_id references unknown pull request {}",
                pr_id
            )));
        }
        if let Some(missing) = reviewer_ids
            .iter()
            .find(|id| !self.working.users.contains_key(*id))
        {
            return Err(StoreError::ForeignKeyViolation(format!(
                "pr_reviewers.user_id references unknown user {}",
                missing
            )));
        }

        self.working.reviewers.retain(|(pr, _)| pr != pr_id);
        for user_id in reviewer_ids {
            if !self
                .working
                .reviewers
                .insert((pr_id.to_string(), user_id.clone()))
            {
                return Err(StoreError::UniqueViolation(Constraint::ReviewerAssignment));
            }
        }
        Ok(())
    }

    async fn pull_requests_for_reviewer(
        &mut self,
        user_id: &str,
    ) -> StoreResult<Vec<PullRequest>> {
        let mut prs: Vec<PullRequest> = self
            .working
            .reviewers
            .iter()
            .filter(|(_, reviewer)| reviewer == user_id)
            .filter_map(|(pr_id, _)| self.working.pull_requests.get(pr_id))
            .map(|pr| self.working.with_reviewers(pr))
            .collect();
        prs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(prs)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, team: &str) -> User {
        User {
            user_id: id.to_string(),
            username: id.to_uppercase(),
            is_active: true,
            team_name: team.to_string(),
        }
    }

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_team("backend").await.unwrap();
        tx.upsert_user(&user("u1", "backend")).await.unwrap();
        tx.upsert_user(&user("u2", "backend")).await.unwrap();
        tx.commit().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = seeded().await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_pull_request(&NewPullRequest::new("pr-1", "Add search", "u1"))
                .await
                .unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.pull_request("pr-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_keys_name_their_constraint() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();

        assert_eq!(
            tx.insert_team("backend").await.unwrap_err(),
            StoreError::UniqueViolation(Constraint::TeamName)
        );

        tx.insert_pull_request(&NewPullRequest::new("pr-1", "A", "u1"))
            .await
            .unwrap();
        assert_eq!(
            tx.insert_pull_request(&NewPullRequest::new("pr-1", "B", "u2"))
                .await
                .unwrap_err(),
            StoreError::UniqueViolation(Constraint::PullRequestId)
        );
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();

        let err = tx.upsert_user(&user("u9", "frontend")).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

        let err = tx
            .insert_pull_request(&NewPullRequest::new("pr-1", "A", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_reviewer_set_is_replaced_and_listed() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.insert_pull_request(&NewPullRequest::new("pr-1", "A", "u1"))
            .await
            .unwrap();
        tx.replace_reviewers("pr-1", &["u2".to_string()])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let pr = tx.pull_request("pr-1").await.unwrap().unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["u2".to_string()]);

        let reviewing = tx.pull_requests_for_reviewer("u2").await.unwrap();
        assert_eq!(reviewing.len(), 1);
        assert!(tx.pull_requests_for_reviewer("u1").await.unwrap().is_empty());

        tx.replace_reviewers("pr-1", &[]).await.unwrap();
        let pr = tx.pull_request("pr-1").await.unwrap().unwrap();
        assert!(pr.assigned_reviewers.is_empty());
    }

    #[tokio::test]
    async fn test_team_members_sorted_by_id() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_team("backend").await.unwrap();
        tx.upsert_user(&user("u3", "backend")).await.unwrap();
        tx.upsert_user(&user("u1", "backend")).await.unwrap();

        let ids: Vec<String> = tx
            .team_members("backend")
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.user_id)
            .collect();
        assert_eq!(ids, vec!["u1".to_string(), "u3".to_string()]);
    }
}
