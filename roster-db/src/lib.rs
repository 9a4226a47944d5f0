//! Database layer for Roster
//!
//! SQLite persistence for teams, users, pull requests and reviewer
//! assignments. [`Database`] implements [`roster_core::Store`], so the core
//! services run unchanged on top of it.

pub mod error;
mod rows;
mod store;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

use roster_core::config::DatabaseConfig;

pub use error::{Error, Result};
pub use store::SqliteTx;

/// How long a connection waits for the write lock before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `db_path` and migrate it
    pub async fn new(db_path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let db_path = db_path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Io(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;

        tracing::info!(path = %db_path.display(), "Database ready");
        Ok(Self { pool })
    }

    /// Open the database described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        Self::new(&config.path, config.max_connections).await
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::models::{NewPullRequest, PrStatus, TeamMember, User};
    use roster_core::store::{Constraint, Store, StoreError};
    use roster_core::{ErrorKind, PullRequestService, TeamService, UserService};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open(temp_dir: &TempDir) -> Database {
        Database::new(temp_dir.path().join("test.db"), 5).await.unwrap()
    }

    fn user(id: &str, team: &str, active: bool) -> User {
        User {
            user_id: id.to_string(),
            username: id.to_uppercase(),
            is_active: active,
            team_name: team.to_string(),
        }
    }

    async fn seeded(temp_dir: &TempDir) -> Database {
        let db = open(temp_dir).await;
        let mut tx = db.begin().await.unwrap();
        tx.insert_team("backend").await.unwrap();
        tx.upsert_user(&user("u1", "backend", true)).await.unwrap();
        tx.upsert_user(&user("u2", "backend", true)).await.unwrap();
        tx.upsert_user(&user("u3", "backend", false)).await.unwrap();
        tx.commit().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let db = Database::new(&db_path, 1).await.unwrap();
        assert!(db_path.exists());
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_database_migrations() {
        let temp_dir = TempDir::new().unwrap();
        let db = open(&temp_dir).await;

        for table in ["teams", "users", "pull_requests", "pr_reviewers"] {
            let result: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
            )
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert_eq!(result.0, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        {
            let _ = seeded(&temp_dir).await;
        }
        let db = open(&temp_dir).await;
        let mut tx = db.begin().await.unwrap();
        assert_eq!(tx.team_members("backend").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unique_violations_name_their_constraint() {
        let temp_dir = TempDir::new().unwrap();
        let db = seeded(&temp_dir).await;
        let mut tx = db.begin().await.unwrap();

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

        let reviewers = vec!["u2".to_string(), "u2".to_string()];
        assert_eq!(
            tx.replace_reviewers("pr-1", &reviewers).await.unwrap_err(),
            StoreError::UniqueViolation(Constraint::ReviewerAssignment)
        );
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let temp_dir = TempDir::new().unwrap();
        let db = seeded(&temp_dir).await;
        let mut tx = db.begin().await.unwrap();

        let err = tx
            .upsert_user(&user("u9", "frontend", true))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

        let err = tx
            .insert_pull_request(&NewPullRequest::new("pr-1", "A", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_rollback_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let db = seeded(&temp_dir).await;

        {
            let mut tx = db.begin().await.unwrap();
            tx.insert_pull_request(&NewPullRequest::new("pr-1", "A", "u1"))
                .await
                .unwrap();
        }

        let mut tx = db.begin().await.unwrap();
        assert!(tx.pull_request("pr-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pull_request_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let db = seeded(&temp_dir).await;

        let new_pr = NewPullRequest::new("pr-1", "Add search", "u1");
        let mut tx = db.begin().await.unwrap();
        tx.insert_pull_request(&new_pr).await.unwrap();
        tx.replace_reviewers("pr-1", &["u3".to_string(), "u2".to_string()])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let pr = tx.pull_request("pr-1").await.unwrap().unwrap();
        assert_eq!(pr.status, PrStatus::Open);
        assert_eq!(pr.created_at, new_pr.created_at);
        assert_eq!(pr.assigned_reviewers, vec!["u2".to_string(), "u3".to_string()]);

        let merged_at = chrono::Utc::now();
        let merged = tx
            .update_pull_request_status("pr-1", PrStatus::Merged, Some(merged_at))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(merged.status, PrStatus::Merged);
        assert_eq!(merged.merged_at, Some(merged_at));
        assert_eq!(merged.assigned_reviewers.len(), 2);

        let queue = tx.pull_requests_for_reviewer("u3").await.unwrap();
        assert_eq!(queue.len(), 1);
        assert!(tx.pull_requests_for_reviewer("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_and_deactivate_user() {
        let temp_dir = TempDir::new().unwrap();
        let db = seeded(&temp_dir).await;
        let mut tx = db.begin().await.unwrap();

        let mut renamed = user("u1", "backend", true);
        renamed.username = "Alice".to_string();
        tx.upsert_user(&renamed).await.unwrap();
        assert_eq!(tx.user("u1").await.unwrap().unwrap().username, "Alice");

        let updated = tx.update_user_active("u1", false).await.unwrap().unwrap();
        assert!(!updated.is_active);
        assert!(tx.update_user_active("ghost", false).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_of_one_id_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let db = seeded(&temp_dir).await;
        let prs = PullRequestService::new(Arc::new(db));

        for round in 0..10 {
            let pr_id = format!("pr-{}", round);
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let prs = prs.clone();
                    let pr_id = pr_id.clone();
                    tokio::spawn(async move {
                        prs.create_pr_with_auto_reviewers(&pr_id, "Race", "u1").await
                    })
                })
                .collect();

            let mut created = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(pr) => {
                        assert_eq!(pr.id, pr_id);
                        created += 1;
                    }
                    Err(e) => assert_eq!(e.kind(), ErrorKind::Conflict, "{}: {}", pr_id, e),
                }
            }
            assert_eq!(created, 1, "{} created more than once", pr_id);
        }
    }

    #[tokio::test]
    async fn test_services_on_sqlite() {
        let temp_dir = TempDir::new().unwrap();
        let store: Arc<dyn Store> = Arc::new(open(&temp_dir).await);

        let members = ["u1", "u2", "u3", "u4"]
            .iter()
            .map(|id| TeamMember {
                user_id: id.to_string(),
                username: id.to_uppercase(),
                is_active: *id != "u4",
            })
            .collect();
        TeamService::new(store.clone())
            .create_team_with_members("backend", members)
            .await
            .unwrap();

        let prs = PullRequestService::new(store.clone());
        let pr = prs
            .create_pr_with_auto_reviewers("pr-1", "Add search", "u1")
            .await
            .unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["u2".to_string(), "u3".to_string()]);

        let err = prs
            .create_pr_with_auto_reviewers("pr-1", "Again", "u2")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let merged = prs.merge_pr("pr-1").await.unwrap();
        let again = prs.merge_pr("pr-1").await.unwrap();
        assert_eq!(again.merged_at, merged.merged_at);

        let err = prs.set_reviewers("pr-1", &["u2".to_string()]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let queue = UserService::new(store)
            .pull_requests_to_review("u2")
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].status, PrStatus::Merged);
    }
}
