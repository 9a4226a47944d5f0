//! JSON error envelope for the HTTP surface

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use roster_core::{Entity, Error, ErrorKind, ReviewerRejection};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Wrapper to make core errors usable as an axum error response
#[derive(Debug)]
pub struct ApiErr(pub Error);

impl ApiErr {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match (&self.0, self.0.kind()) {
            (_, ErrorKind::NotFound) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            (Error::Conflict(Entity::PullRequest(_)), _) => (StatusCode::BAD_REQUEST, "PR_EXISTS"),
            (_, ErrorKind::Conflict) => (StatusCode::BAD_REQUEST, "TEAM_EXISTS"),
            (_, ErrorKind::InvalidState) => (StatusCode::BAD_REQUEST, "PR_MERGED"),
            (Error::InvalidReviewer(ReviewerRejection::NotAssigned { .. }), _) => {
                (StatusCode::BAD_REQUEST, "NOT_ASSIGNED")
            }
            (_, ErrorKind::InvalidReviewer) => (StatusCode::BAD_REQUEST, "NO_CANDIDATE"),
            (_, ErrorKind::Internal) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(code, error = %self.0, "Request rejected");
            self.0.to_string()
        };
        (
            status,
            Json(ErrorEnvelope {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}

impl From<Error> for ApiErr {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::StoreError;

    fn code(err: Error) -> (StatusCode, &'static str) {
        ApiErr(err).status_and_code()
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            code(Error::NotFound(Entity::Team("x".into()))),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            code(Error::Conflict(Entity::PullRequest("pr-1".into()))),
            (StatusCode::BAD_REQUEST, "PR_EXISTS")
        );
        assert_eq!(
            code(Error::Conflict(Entity::Team("backend".into()))),
            (StatusCode::BAD_REQUEST, "TEAM_EXISTS")
        );
        assert_eq!(
            code(Error::InvalidState {
                pr_id: "pr-1".into()
            }),
            (StatusCode::BAD_REQUEST, "PR_MERGED")
        );
        assert_eq!(
            code(
                ReviewerRejection::NotAssigned {
                    user_id: "u2".into(),
                    pr_id: "pr-1".into()
                }
                .into()
            ),
            (StatusCode::BAD_REQUEST, "NOT_ASSIGNED")
        );
        assert_eq!(
            code(ReviewerRejection::Inactive { user_id: "u4".into() }.into()),
            (StatusCode::BAD_REQUEST, "NO_CANDIDATE")
        );
        assert_eq!(
            code(StoreError::Backend("disk full".into()).into()),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
        );
    }
}
