//! /users routes

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use roster_core::User;
use serde::{Deserialize, Serialize};

use super::pull_requests::PullRequestShort;
use super::{ApiErr, AppState};

#[derive(Debug, Deserialize)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewQueueResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

async fn set_is_active(
    State(state): State<AppState>,
    Json(req): Json<SetIsActiveRequest>,
) -> Result<Json<User>, ApiErr> {
    let user = state.users.set_is_active(&req.user_id, req.is_active).await?;
    Ok(Json(user))
}

async fn get_review(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ReviewQueueResponse>, ApiErr> {
    let prs = state.users.pull_requests_to_review(&query.user_id).await?;
    Ok(Json(ReviewQueueResponse {
        user_id: query.user_id,
        pull_requests: prs.into_iter().map(PullRequestShort::from).collect(),
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
}
