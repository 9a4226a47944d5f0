//! Team creation and lookup

use std::sync::Arc;

use crate::error::{Entity, Error, Result};
use crate::models::{TeamMember, TeamWithMembers};
use crate::store::{Constraint, Store, StoreError};

/// Team operations
#[derive(Clone)]
pub struct TeamService {
    store: Arc<dyn Store>,
}

impl TeamService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a team and upsert its members onto it.
    ///
    /// A member that already exists is moved to the new team with the given
    /// username and activity flag.
    pub async fn create_team_with_members(
        &self,
        team_name: &str,
        members: Vec<TeamMember>,
    ) -> Result<TeamWithMembers> {
        let mut tx = self.store.begin().await?;

        let team = tx.insert_team(team_name).await.map_err(|e| match e {
            StoreError::UniqueViolation(Constraint::TeamName) => {
                Error::Conflict(Entity::Team(team_name.to_string()))
            }
            other => Error::Store(other),
        })?;

        let member_count = members.len();
        for member in members {
            tx.upsert_user(&member.into_user(team_name)).await?;
        }

        let members = tx.team_members(team_name).await?;
        tx.commit().await?;

        tracing::info!(team = team_name, members = member_count, "Created team");
        Ok(TeamWithMembers { team, members })
    }

    /// Get a team and its members ordered by user id
    pub async fn get_team_with_members(&self, team_name: &str) -> Result<TeamWithMembers> {
        let mut tx = self.store.begin().await?;
        let team = tx
            .team(team_name)
            .await?
            .ok_or_else(|| Error::NotFound(Entity::Team(team_name.to_string())))?;
        let members = tx.team_members(team_name).await?;
        Ok(TeamWithMembers { team, members })
    }
}
