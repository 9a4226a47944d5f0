//! Error types for database operations

use roster_core::store::{Constraint, StoreError};
use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum Error {
    /// SQLx database error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, Error>;

/// Map a SQLite unique-constraint message to the constraint it names.
///
/// SQLite reports `UNIQUE constraint failed: <table>.<col>[, <table>.<col>]`.
fn constraint_from_message(message: &str) -> Constraint {
    let columns = message
        .strip_prefix("UNIQUE constraint failed: ")
        .unwrap_or(message);
    match columns {
        "teams.name" => Constraint::TeamName,
        "users.user_id" => Constraint::UserId,
        "pull_requests.id" => Constraint::PullRequestId,
        "pr_reviewers.pr_id, pr_reviewers.user_id" => Constraint::ReviewerAssignment,
        other => Constraint::Other(other.to_string()),
    }
}

/// Classify a sqlx error for the domain layer
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation(constraint_from_message(db_err.message()));
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::ForeignKeyViolation(db_err.message().to_string());
        }
    }
    StoreError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_from_message() {
        assert_eq!(
            constraint_from_message("UNIQUE constraint failed: pull_requests.id"),
            Constraint::PullRequestId
        );
        assert_eq!(
            constraint_from_message("UNIQUE constraint failed: teams.name"),
            Constraint::TeamName
        );
        assert_eq!(
            constraint_from_message("UNIQUE constraint failed: pr_reviewers.pr_id, pr_reviewers.user_id"),
            Constraint::ReviewerAssignment
        );
        assert_eq!(
            constraint_from_message("UNIQUE constraint failed: widgets.sku"),
            Constraint::Other("widgets.sku".to_string())
        );
    }

    #[test]
    fn test_non_database_errors_are_backend() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }
}
