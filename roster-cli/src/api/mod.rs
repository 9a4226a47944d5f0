//! HTTP API
//!
//! Thin axum layer over the core services. Handlers parse the request, call
//! one service method and serialize the result; every rule lives in
//! `roster_core`.

mod error;
mod pull_requests;
mod teams;
mod users;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use roster_core::{PullRequestService, Store, TeamService, UserService};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

pub use error::ApiErr;

/// Shared state for the axum routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub teams: TeamService,
    pub users: UserService,
    pub pull_requests: PullRequestService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            teams: TeamService::new(store.clone()),
            users: UserService::new(store.clone()),
            pull_requests: PullRequestService::new(store.clone()),
            store,
        }
    }
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiErr> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiErr(e.into()))?;
    Ok(Json(json!({ "status": "healthy" })))
}

/// Build the full router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(teams::routes())
        .merge(users::routes())
        .merge(pull_requests::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
