//! /pullRequests routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use roster_core::{PrStatus, PullRequest};
use serde::{Deserialize, Serialize};

use super::{ApiErr, AppState};

/// Full pull request representation
#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
    pub assigned_reviewers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers: pr.assigned_reviewers,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

/// List entry without reviewers or timestamps
#[derive(Debug, Serialize)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
}

impl From<PullRequest> for PullRequestShort {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestRef {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
    pub new_user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetReviewersRequest {
    pub pull_request_id: String,
    pub reviewer_ids: Vec<String>,
}

type PrResult = Result<Json<PullRequestResponse>, ApiErr>;

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<PullRequestResponse>), ApiErr> {
    let pr = state
        .pull_requests
        .create_pr_with_auto_reviewers(&req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await?;
    Ok((StatusCode::CREATED, Json(pr.into())))
}

async fn merge(State(state): State<AppState>, Json(req): Json<PullRequestRef>) -> PrResult {
    let pr = state.pull_requests.merge_pr(&req.pull_request_id).await?;
    Ok(Json(pr.into()))
}

async fn reassign(State(state): State<AppState>, Json(req): Json<ReassignRequest>) -> PrResult {
    let pr = state
        .pull_requests
        .replace_reviewer(&req.pull_request_id, &req.old_user_id, &req.new_user_id)
        .await?;
    Ok(Json(pr.into()))
}

async fn set_reviewers(
    State(state): State<AppState>,
    Json(req): Json<SetReviewersRequest>,
) -> PrResult {
    let pr = state
        .pull_requests
        .set_reviewers(&req.pull_request_id, &req.reviewer_ids)
        .await?;
    Ok(Json(pr.into()))
}

async fn auto_assign(State(state): State<AppState>, Json(req): Json<PullRequestRef>) -> PrResult {
    let pr = state
        .pull_requests
        .auto_assign_reviewers(&req.pull_request_id)
        .await?;
    Ok(Json(pr.into()))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pullRequests/create", post(create))
        .route("/pullRequests/merge", post(merge))
        .route("/pullRequests/reassign", post(reassign))
        .route("/pullRequests/setReviewers", post(set_reviewers))
        .route("/pullRequests/autoAssign", post(auto_assign))
}
