//! Session mirror backed by Redis
//!
//! The session entry is the application-level proof of an active login:
//! a signature-valid access token whose session entry is gone is treated
//! as logged out. The value is the serialized user snapshot, which is
//! what the auth gate serves on the hot path instead of a database read.

use anyhow::Result;
use common::cache::RedisPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::User;

/// Key namespace for session entries, distinct from the course cache
fn session_key(user_id: Uuid) -> String {
    format!("session:{}", user_id)
}

/// Session store over the shared Redis primitive
#[derive(Clone)]
pub struct SessionStore {
    cache: RedisPool,
    /// Session TTL in seconds, kept equal to the refresh token lifetime
    ttl: u64,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(cache: RedisPool, ttl: u64) -> Self {
        Self { cache, ttl }
    }

    /// Write the user snapshot, renewing the TTL
    ///
    /// Called on login, social auth, refresh, and every profile
    /// mutation so the mirror never serves a stale identity for long.
    pub async fn save(&self, user: &User) -> Result<()> {
        info!("Saving session for user: {}", user.id);

        let snapshot = serde_json::to_string(user)?;
        self.cache
            .set(&session_key(user.id), &snapshot, Some(self.ttl))
            .await?;

        Ok(())
    }

    /// Load the snapshot for a user, `None` when the session is gone
    pub async fn get(&self, user_id: Uuid) -> Result<Option<User>> {
        let Some(snapshot) = self.cache.get(&session_key(user_id)).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&snapshot) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                // An unreadable snapshot is treated as logged out rather
                // than failing every request for this user.
                warn!("Discarding malformed session snapshot for {}: {}", user_id, e);
                self.cache.delete(&session_key(user_id)).await?;
                Ok(None)
            }
        }
    }

    /// Delete the session entry, ending the login
    pub async fn delete(&self, user_id: Uuid) -> Result<()> {
        info!("Deleting session for user: {}", user_id);

        self.cache.delete(&session_key(user_id)).await?;
        Ok(())
    }
}
