//! PostgreSQL implementation of ModelCatalog

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use audit_core::entities::ModelDescriptor;
use audit_core::traits::{ModelCatalog, RepoResult};

use crate::mappers::model_descriptor;
use crate::models::{IrModelFieldRow, IrModelRow};

use super::error::map_db_error;

const MODEL_COLUMNS: &str = "\
    id, model, name, table_name, history, computed, rec_name, \
    to_regclass(quote_ident(table_name)) IS NOT NULL AS table_present, \
    to_regclass(quote_ident(table_name || '__history')) IS NOT NULL AS history_present";

const FIELD_COLUMNS: &str = "\
    model_id, name, label, ttype, relation, relation_field, relation_table, \
    relation_origin, relation_target, selection";

/// PostgreSQL implementation of ModelCatalog, reading the ir_model registry
#[derive(Clone)]
pub struct PgModelCatalog {
    pool: PgPool,
}

impl PgModelCatalog {
    /// Create a new PgModelCatalog
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registered models whose storage is not present yet are left out
    fn is_loaded(row: &IrModelRow) -> bool {
        if row.computed {
            return true;
        }
        if !row.table_present {
            tracing::debug!(model = %row.model, "Skipping model without table");
            return false;
        }
        if row.history && !row.history_present {
            tracing::debug!(model = %row.model, "Skipping historized model without history table");
            return false;
        }
        true
    }

    async fn load(&self, name: Option<&str>) -> RepoResult<Vec<ModelDescriptor>> {
        let rows = match name {
            Some(name) => {
                sqlx::query_as::<_, IrModelRow>(&format!(
                    "SELECT {MODEL_COLUMNS} FROM ir_model WHERE model = $1"
                ))
                .bind(name)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, IrModelRow>(&format!(
                    "SELECT {MODEL_COLUMNS} FROM ir_model ORDER BY id"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        let rows: Vec<IrModelRow> = rows.into_iter().filter(Self::is_loaded).collect();
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let fields = sqlx::query_as::<_, IrModelFieldRow>(&format!(
            "SELECT {FIELD_COLUMNS} FROM ir_model_field \
             WHERE model_id = ANY($1) ORDER BY model_id, sequence, id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let mut by_model: HashMap<i64, Vec<IrModelFieldRow>> = HashMap::new();
        for field in fields {
            by_model.entry(field.model_id).or_default().push(field);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let fields = by_model.remove(&row.id).unwrap_or_default();
                model_descriptor(row, fields)
            })
            .collect())
    }
}

#[async_trait]
impl ModelCatalog for PgModelCatalog {
    #[instrument(skip(self))]
    async fn list_models(&self) -> RepoResult<Vec<ModelDescriptor>> {
        self.load(None).await
    }

    #[instrument(skip(self))]
    async fn find_model(&self, name: &str) -> RepoResult<Option<ModelDescriptor>> {
        Ok(self.load(Some(name)).await?.into_iter().next())
    }
}
