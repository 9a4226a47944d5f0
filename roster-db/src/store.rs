//! `Store` implementation over the SQLite pool

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roster_core::models::{NewPullRequest, PrStatus, PullRequest, Team, User};
use roster_core::store::{Store, StoreResult, StoreTx};
use sqlx::{Sqlite, Transaction};

use crate::error::store_error;
use crate::rows::{PullRequestRow, UserRow};
use crate::Database;

#[async_trait]
impl Store for Database {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        // Take the write lock up front. A deferred transaction that reads and
        // then writes fails with SQLITE_BUSY instead of waiting.
        let tx = self
            .pool()
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(store_error)?;
        Ok(Box::new(SqliteTx { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

/// One SQLite transaction. Rolled back on drop unless committed.
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteTx {
    async fn reviewers_of(&mut self, pr_id: &str) -> StoreResult<Vec<String>> {
        sqlx::query_scalar("SELECT user_id FROM pr_reviewers WHERE pr_id = ? ORDER BY user_id")
            .bind(pr_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(store_error)
    }

    async fn with_reviewers(&mut self, row: PullRequestRow) -> StoreResult<PullRequest> {
        let reviewers = self.reviewers_of(&row.id).await?;
        row.into_pull_request(reviewers)
    }
}

#[async_trait]
impl StoreTx for SqliteTx {
    async fn team(&mut self, name: &str) -> StoreResult<Option<Team>> {
        let name: Option<String> = sqlx::query_scalar("SELECT name FROM teams WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(name.map(|name| Team { name }))
    }

    async fn insert_team(&mut self, name: &str) -> StoreResult<Team> {
        sqlx::query("INSERT INTO teams (name) VALUES (?)")
            .bind(name)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(Team {
            name: name.to_string(),
        })
    }

    async fn user(&mut self, user_id: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, username, is_active, team_name FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(row.map(User::from))
    }

    async fn upsert_user(&mut self, user: &User) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (user_id, username, is_active, team_name)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                is_active = excluded.is_active,
                team_name = excluded.team_name
            RETURNING user_id, username, is_active, team_name
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(user.is_active)
        .bind(&user.team_name)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(row.into())
    }

    async fn team_members(&mut self, team_name: &str) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT user_id, username, is_active, team_name FROM users
             WHERE team_name = ? ORDER BY user_id",
        )
        .bind(team_name)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_user_active(
        &mut self,
        user_id: &str,
        is_active: bool,
    ) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE users SET is_active = ? WHERE user_id = ?
             RETURNING user_id, username, is_active, team_name",
        )
        .bind(is_active)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(row.map(User::from))
    }

    async fn pull_request(&mut self, id: &str) -> StoreResult<Option<PullRequest>> {
        let row: Option<PullRequestRow> = sqlx::query_as(
            "SELECT id, name, author_id, status, created_at, merged_at
             FROM pull_requests WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => Ok(Some(self.with_reviewers(row).await?)),
            None => Ok(None),
        }
    }

    async fn insert_pull_request(&mut self, pr: &NewPullRequest) -> StoreResult<PullRequest> {
        let row: PullRequestRow = sqlx::query_as(
            "INSERT INTO pull_requests (id, name, author_id, status, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, name, author_id, status, created_at, merged_at",
        )
        .bind(&pr.id)
        .bind(&pr.name)
        .bind(&pr.author_id)
        .bind(PrStatus::initial().as_str())
        .bind(pr.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(store_error)?;

        tracing::debug!(pr_id = %row.id, "Inserted pull request row");
        row.into_pull_request(Vec::new())
    }

    async fn update_pull_request_status(
        &mut self,
        id: &str,
        status: PrStatus,
        merged_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<PullRequest>> {
        let row: Option<PullRequestRow> = sqlx::query_as(
            "UPDATE pull_requests SET status = ?, merged_at = ? WHERE id = ?
             RETURNING id, name, author_id, status, created_at, merged_at",
        )
        .bind(status.as_str())
        .bind(merged_at)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => Ok(Some(self.with_reviewers(row).await?)),
            None => Ok(None),
        }
    }

    async fn replace_reviewers(
        &mut self,
        pr_id: &str,
        reviewer_ids: &[String],
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = ?")
            .bind(pr_id)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;

        for user_id in reviewer_ids {
            sqlx::query("INSERT INTO pr_reviewers (pr_id, user_id) VALUES (?, ?)")
                .bind(pr_id)
                .bind(user_id)
                .execute(&mut *self.tx)
                .await
                .map_err(store_error)?;
        }
        Ok(())
    }

    async fn pull_requests_for_reviewer(
        &mut self,
        user_id: &str,
    ) -> StoreResult<Vec<PullRequest>> {
        let rows: Vec<PullRequestRow> = sqlx::query_as(
            "SELECT p.id, p.name, p.author_id, p.status, p.created_at, p.merged_at
             FROM pull_requests p
             JOIN pr_reviewers r ON r.pr_id = p.id
             WHERE r.user_id = ?
             ORDER BY p.created_at, p.id",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(store_error)?;

        let mut prs = Vec::with_capacity(rows.len());
        for row in rows {
            prs.push(self.with_reviewers(row).await?);
        }
        Ok(prs)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(store_error)
    }
}
