//! Report wizard session storage in Redis.
//!
//! Sessions are stored as JSON with a TTL that restarts on every update.

use async_trait::async_trait;

use audit_core::traits::{RepoResult, SessionStore};

use crate::pool::RedisPool;

/// Key prefix for wizard sessions
const WIZARD_SESSION_PREFIX: &str = "wizard_session:";

/// Default session lifetime (1 hour)
const DEFAULT_SESSION_TTL: u64 = 60 * 60;

/// Redis-backed implementation of SessionStore
#[derive(Clone)]
pub struct WizardSessionStore {
    pool: RedisPool,
    ttl_seconds: u64,
}

impl WizardSessionStore {
    /// Create a new session store
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            ttl_seconds: DEFAULT_SESSION_TTL,
        }
    }

    /// Create with custom TTL
    #[must_use]
    pub fn with_ttl(pool: RedisPool, ttl_seconds: u64) -> Self {
        Self { pool, ttl_seconds }
    }

    fn key(id: &str) -> String {
        format!("{WIZARD_SESSION_PREFIX}{id}")
    }
}

#[async_trait]
impl SessionStore for WizardSessionStore {
    async fn put(&self, id: &str, state: serde_json::Value) -> RepoResult<()> {
        self.pool
            .set(&Self::key(id), &state, Some(self.ttl_seconds))
            .await?;
        tracing::debug!(session_id = %id, ttl = self.ttl_seconds, "Stored wizard session");
        Ok(())
    }

    async fn get(&self, id: &str) -> RepoResult<Option<serde_json::Value>> {
        Ok(self.pool.get_value(&Self::key(id)).await?)
    }

    async fn remove(&self, id: &str) -> RepoResult<()> {
        if self.pool.delete(&Self::key(id)).await? {
            tracing::debug!(session_id = %id, "Removed wizard session");
        }
        Ok(())
    }
}
