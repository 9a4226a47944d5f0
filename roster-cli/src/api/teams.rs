//! /teams routes

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use roster_core::{TeamMember, TeamWithMembers};
use serde::{Deserialize, Serialize};

use super::{ApiErr, AppState};

#[derive(Debug, Deserialize)]
pub struct AddTeamRequest {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: String,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

impl From<TeamWithMembers> for TeamResponse {
    fn from(team: TeamWithMembers) -> Self {
        Self {
            team_name: team.team.name,
            members: team
                .members
                .into_iter()
                .map(|u| TeamMember {
                    user_id: u.user_id,
                    username: u.username,
                    is_active: u.is_active,
                })
                .collect(),
        }
    }
}

async fn add_team(
    State(state): State<AppState>,
    Json(req): Json<AddTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiErr> {
    let team = state
        .teams
        .create_team_with_members(&req.team_name, req.members)
        .await?;
    Ok((StatusCode::CREATED, Json(team.into())))
}

async fn get_team(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<TeamResponse>, ApiErr> {
    let team = state.teams.get_team_with_members(&query.team_name).await?;
    Ok(Json(team.into()))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/teams/add", post(add_team))
        .route("/teams/get", get(get_team))
}
