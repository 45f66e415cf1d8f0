//! PostgreSQL implementation of NotificationRuleRepository

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use audit_core::entities::{NewNotificationRule, NotificationRule};
use audit_core::error::DomainError;
use audit_core::traits::{NotificationRuleRepository, RepoResult};
use audit_core::value_objects::WatchedField;

use crate::mappers::notification_rule;
use crate::models::{NotificationRuleRow, RuleTargetRow};

use super::error::{map_constraint_violation, map_db_error};

/// PostgreSQL implementation of NotificationRuleRepository
#[derive(Clone)]
pub struct PgNotificationRuleRepository {
    pool: PgPool,
}

impl PgNotificationRuleRepository {
    /// Create a new PgNotificationRuleRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reject a target listed twice
    fn check_targets(targets: &[WatchedField]) -> RepoResult<()> {
        let mut seen = HashSet::new();
        for target in targets {
            if !seen.insert(target) {
                return Err(DomainError::DuplicateTarget {
                    model: target.model.clone(),
                    field: target.field.clone(),
                });
            }
        }
        Ok(())
    }

    fn map_write_error(e: sqlx::Error, rule: &NewNotificationRule) -> DomainError {
        let server = rule.mail_server_id.unwrap_or_default();
        map_constraint_violation(
            e,
            || match rule.targets.first() {
                Some(t) => DomainError::DuplicateTarget {
                    model: t.model.clone(),
                    field: t.field.clone(),
                },
                None => DomainError::ValidationError("duplicate target".to_string()),
            },
            || DomainError::MailServerNotFound(server),
        )
    }

    async fn insert_targets(
        tx: &mut Transaction<'_, Postgres>,
        rule_id: i64,
        targets: &[WatchedField],
    ) -> RepoResult<()> {
        let models: Vec<&str> = targets.iter().map(|t| t.model.as_str()).collect();
        let fields: Vec<&str> = targets.iter().map(|t| t.field.as_str()).collect();

        sqlx::query(
            r#"
            INSERT INTO notification_rule_field (rule_id, model, field)
            SELECT $1, m, f FROM UNNEST($2::text[], $3::text[]) AS t(m, f)
            "#,
        )
        .bind(rule_id)
        .bind(&models)
        .bind(&fields)
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn targets_of(&self, rule_ids: &[i64]) -> RepoResult<Vec<RuleTargetRow>> {
        sqlx::query_as::<_, RuleTargetRow>(
            r#"
            SELECT rule_id, model, field
            FROM notification_rule_field
            WHERE rule_id = ANY($1)
            ORDER BY rule_id, model, field
            "#,
        )
        .bind(rule_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[async_trait]
impl NotificationRuleRepository for PgNotificationRuleRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> RepoResult<Vec<NotificationRule>> {
        let rows = sqlx::query_as::<_, NotificationRuleRow>(
            r#"
            SELECT id, name, email, mail_server_id, created_at, updated_at
            FROM notification_rule
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let targets = self.targets_of(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| notification_rule(row, &targets))
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<NotificationRule>> {
        let row = sqlx::query_as::<_, NotificationRuleRow>(
            r#"
            SELECT id, name, email, mail_server_id, created_at, updated_at
            FROM notification_rule
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let targets = self.targets_of(&[id]).await?;
        Ok(Some(notification_rule(row, &targets)))
    }

    #[instrument(skip(self, rule), fields(name = %rule.name))]
    async fn create(&self, rule: &NewNotificationRule) -> RepoResult<NotificationRule> {
        Self::check_targets(&rule.targets)?;
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let row = sqlx::query_as::<_, NotificationRuleRow>(
            r#"
            INSERT INTO notification_rule (name, email, mail_server_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, mail_server_id, created_at, updated_at
            "#,
        )
        .bind(&rule.name)
        .bind(&rule.email)
        .bind(rule.mail_server_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Self::map_write_error(e, rule))?;

        Self::insert_targets(&mut tx, row.id, &rule.targets).await?;
        tx.commit().await.map_err(map_db_error)?;

        let targets = self.targets_of(&[row.id]).await?;
        Ok(notification_rule(row, &targets))
    }

    #[instrument(skip(self, rule), fields(name = %rule.name))]
    async fn update(&self, id: i64, rule: &NewNotificationRule) -> RepoResult<NotificationRule> {
        Self::check_targets(&rule.targets)?;
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let row = sqlx::query_as::<_, NotificationRuleRow>(
            r#"
            UPDATE notification_rule
            SET name = $2, email = $3, mail_server_id = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, mail_server_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&rule.name)
        .bind(&rule.email)
        .bind(rule.mail_server_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| Self::map_write_error(e, rule))?
        .ok_or(DomainError::RuleNotFound(id))?;

        sqlx::query("DELETE FROM notification_rule_field WHERE rule_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        Self::insert_targets(&mut tx, id, &rule.targets).await?;
        tx.commit().await.map_err(map_db_error)?;

        let targets = self.targets_of(&[id]).await?;
        Ok(notification_rule(row, &targets))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM notification_rule WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::RuleNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_targets(&self) -> RepoResult<Vec<(WatchedField, i64)>> {
        let rows = sqlx::query_as::<_, RuleTargetRow>(
            r#"
            SELECT rule_id, model, field
            FROM notification_rule_field
            ORDER BY model, field, rule_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows
            .into_iter()
            .map(|r| (WatchedField::new(r.model, r.field), r.rule_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_targets_rejected() {
        let targets = vec![
            WatchedField::new("project.task", "priority"),
            WatchedField::new("project.task", "name"),
            WatchedField::new("project.task", "priority"),
        ];
        assert!(matches!(
            PgNotificationRuleRepository::check_targets(&targets),
            Err(DomainError::DuplicateTarget { ref field, .. }) if field == "priority"
        ));
        assert!(PgNotificationRuleRepository::check_targets(&targets[..2]).is_ok());
    }
}
