//! Error types for Roster

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias for Roster operations
pub type Result<T> = std::result::Result<T, Error>;

/// An entity referenced by its key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// Pull request by id
    PullRequest(String),
    /// User by user_id
    User(String),
    /// Team by name
    Team(String),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::PullRequest(id) => write!(f, "PR with id {}", id),
            Entity::User(id) => write!(f, "User with id {}", id),
            Entity::Team(name) => write!(f, "Team with name {}", name),
        }
    }
}

/// Why a reviewer was refused for a pull request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewerRejection {
    #[error("User with id {user_id} is not active")]
    Inactive { user_id: String },

    #[error("Cannot assign PR author {user_id} as reviewer")]
    IsAuthor { user_id: String },

    #[error("Reviewer {user_id} from team {team_name} must be from the same team as the author ({author_team})")]
    WrongTeam {
        user_id: String,
        team_name: String,
        author_team: String,
    },

    #[error("User {user_id} is not assigned to PR {pr_id}")]
    NotAssigned { user_id: String, pr_id: String },

    #[error("Cannot assign more than {max} reviewers ({requested} requested)")]
    TooMany { requested: usize, max: usize },

    #[error("User {user_id} is already a reviewer of PR {pr_id}")]
    Duplicate { user_id: String, pr_id: String },
}

/// Coarse classification used by callers that only care about the category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    InvalidReviewer,
    Internal,
}

/// Error type for Roster operations
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced entity does not exist
    #[error("{0} does not exist")]
    NotFound(Entity),

    /// Entity key already taken
    #[error("{0} already exists")]
    Conflict(Entity),

    /// Mutation attempted on a merged pull request
    #[error("Cannot change reviewers on merged PR {pr_id}")]
    InvalidState { pr_id: String },

    /// Reviewer failed validation
    #[error(transparent)]
    InvalidReviewer(#[from] ReviewerRejection),

    /// Unclassified storage failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::InvalidState { .. } => ErrorKind::InvalidState,
            Error::InvalidReviewer(_) => ErrorKind::InvalidReviewer,
            Error::Store(_) | Error::Config(_) | Error::Io(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn pr_not_found(pr_id: &str) -> Self {
        Error::NotFound(Entity::PullRequest(pr_id.to_string()))
    }

    pub(crate) fn user_not_found(user_id: &str) -> Self {
        Error::NotFound(Entity::User(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Constraint;

    #[test]
    fn test_messages_name_the_entity() {
        let err = Error::NotFound(Entity::PullRequest("pr-1".to_string()));
        assert_eq!(err.to_string(), "PR with id pr-1 does not exist");

        let err = Error::Conflict(Entity::Team("backend".to_string()));
        assert_eq!(err.to_string(), "Team with name backend already exists");
    }

    #[test]
    fn test_rejection_is_transparent() {
        let err: Error = ReviewerRejection::TooMany {
            requested: 3,
            max: 2,
        }
        .into();
        assert_eq!(err.to_string(), "Cannot assign more than 2 reviewers (3 requested)");
        assert_eq!(err.kind(), ErrorKind::InvalidReviewer);
    }

    #[test]
    fn test_store_errors_are_internal() {
        let err: Error = StoreError::UniqueViolation(Constraint::UserId).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(
            Error::InvalidState {
                pr_id: "pr-1".to_string()
            }
            .kind(),
            ErrorKind::InvalidState
        );
    }
}
