//! PostgreSQL implementation of MailServerRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use audit_core::entities::{MailServer, NewMailServer};
use audit_core::error::DomainError;
use audit_core::traits::{MailServerRepository, RepoResult};

use crate::models::MailServerRow;

use super::error::map_db_error;

/// PostgreSQL implementation of MailServerRepository
#[derive(Clone)]
pub struct PgMailServerRepository {
    pool: PgPool,
}

impl PgMailServerRepository {
    /// Create a new PgMailServerRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MailServerRepository for PgMailServerRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> RepoResult<Vec<MailServer>> {
        let rows = sqlx::query_as::<_, MailServerRow>(
            r#"
            SELECT id, name, host, port, from_address, username, password, tls
            FROM mail_server
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(MailServer::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<MailServer>> {
        let row = sqlx::query_as::<_, MailServerRow>(
            r#"
            SELECT id, name, host, port, from_address, username, password, tls
            FROM mail_server
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(MailServer::from))
    }

    #[instrument(skip(self, server), fields(name = %server.name))]
    async fn create(&self, server: &NewMailServer) -> RepoResult<MailServer> {
        let row = sqlx::query_as::<_, MailServerRow>(
            r#"
            INSERT INTO mail_server (name, host, port, from_address, username, password, tls)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, host, port, from_address, username, password, tls
            "#,
        )
        .bind(&server.name)
        .bind(&server.host)
        .bind(i32::from(server.port))
        .bind(&server.from_address)
        .bind(&server.username)
        .bind(&server.password)
        .bind(server.tls.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(MailServer::from(row))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM mail_server WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MailServerNotFound(id));
        }
        Ok(())
    }
}
