//! User activity and review queues

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{PullRequest, User};
use crate::store::Store;

/// User operations
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Set whether a user may be picked as a reviewer.
    ///
    /// Existing assignments are left alone.
    pub async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .update_user_active(user_id, is_active)
            .await?
            .ok_or_else(|| Error::user_not_found(user_id))?;
        tx.commit().await?;

        tracing::info!(user_id, is_active, "Updated user activity");
        Ok(user)
    }

    /// Pull requests the user is assigned to review, oldest first
    pub async fn pull_requests_to_review(&self, user_id: &str) -> Result<Vec<PullRequest>> {
        let mut tx = self.store.begin().await?;
        if tx.user(user_id).await?.is_none() {
            return Err(Error::user_not_found(user_id));
        }
        Ok(tx.pull_requests_for_reviewer(user_id).await?)
    }
}
