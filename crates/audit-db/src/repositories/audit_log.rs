//! PostgreSQL implementation of AuditLogRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use audit_core::entities::{AuditEvent, AuditLogQuery, ModelDescriptor};
use audit_core::traits::{AuditLogRepository, RepoResult};

use crate::mappers::audit_event;
use crate::models::AuditEventRow;
use crate::query::{bind_query_as, build_union_query};

use super::error::map_db_error;

/// PostgreSQL implementation of AuditLogRepository
#[derive(Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    /// Create a new PgAuditLogRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    #[instrument(skip(self, models), fields(models = models.len()))]
    async fn query_events(
        &self,
        models: &[ModelDescriptor],
        query: &AuditLogQuery,
    ) -> RepoResult<Vec<AuditEvent>> {
        let Some(union) = build_union_query(models, query) else {
            return Ok(Vec::new());
        };
        tracing::debug!(subqueries = union.subqueries, "Querying audit log");

        let rows = bind_query_as(sqlx::query_as::<_, AuditEventRow>(&union.sql), &union.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(audit_event).collect()
    }
}
