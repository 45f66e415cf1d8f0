//! Notification rule service
//!
//! Rules CRUD. Every successful mutation clears the notification field
//! cache; the next intercepted write rebuilds it.

use tracing::{info, instrument};
use validator::Validate;

use audit_core::entities::{NewNotificationRule, NotificationRule};
use audit_core::value_objects::WatchedField;
use audit_core::DomainError;

use crate::dto::{CreateRuleRequest, RuleResponse, UpdateRuleRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::watch::is_excluded;

/// Notification rule service
pub struct RuleService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RuleService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// List rules
    #[instrument(skip(self))]
    pub async fn list(&self) -> ServiceResult<Vec<RuleResponse>> {
        let rules = self.ctx.rule_repo().list().await?;
        Ok(rules.into_iter().map(RuleResponse::from).collect())
    }

    /// Get a rule
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ServiceResult<RuleResponse> {
        Ok(RuleResponse::from(self.find(id).await?))
    }

    /// Create a rule
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateRuleRequest) -> ServiceResult<RuleResponse> {
        request.validate()?;
        let rule = NewNotificationRule::from(request);
        self.check_targets(&rule.targets).await?;

        let created = self.ctx.rule_repo().create(&rule).await?;
        self.ctx.field_cache().invalidate();

        info!(rule_id = created.id, targets = created.targets.len(), "Notification rule created");
        Ok(RuleResponse::from(created))
    }

    /// Update a rule; absent fields keep their value
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateRuleRequest) -> ServiceResult<RuleResponse> {
        request.validate()?;
        let existing = self.find(id).await?;

        let rule = NewNotificationRule {
            name: request.name.unwrap_or(existing.name),
            email: request.email.unwrap_or(existing.email),
            mail_server_id: request.mail_server_id.unwrap_or(existing.mail_server_id),
            targets: request.targets.unwrap_or(existing.targets),
        };
        rule.validate()?;
        self.check_targets(&rule.targets).await?;

        let updated = self.ctx.rule_repo().update(id, &rule).await?;
        self.ctx.field_cache().invalidate();

        info!(rule_id = id, "Notification rule updated");
        Ok(RuleResponse::from(updated))
    }

    /// Delete a rule
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.ctx.rule_repo().delete(id).await?;
        self.ctx.field_cache().invalidate();

        info!(rule_id = id, "Notification rule deleted");
        Ok(())
    }

    async fn find(&self, id: i64) -> ServiceResult<NotificationRule> {
        Ok(self
            .ctx
            .rule_repo()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::RuleNotFound(id))?)
    }

    /// Targets must name stored fields of registered, interceptable models
    async fn check_targets(&self, targets: &[WatchedField]) -> ServiceResult<()> {
        for (i, target) in targets.iter().enumerate() {
            if targets[..i].contains(target) {
                return Err(DomainError::DuplicateTarget {
                    model: target.model.clone(),
                    field: target.field.clone(),
                }
                .into());
            }
            if is_excluded(&target.model) {
                return Err(ServiceError::validation(format!(
                    "model {} cannot be watched",
                    target.model
                )));
            }
            let model = self
                .ctx
                .catalog()
                .find_model(&target.model)
                .await?
                .ok_or_else(|| {
                    ServiceError::validation(format!("unknown model {}", target.model))
                })?;
            match model.field(&target.field) {
                Some(field) if !field.is_audit_metadata() => {}
                Some(_) => {
                    return Err(ServiceError::validation(format!(
                        "field {}.{} cannot be watched",
                        target.model, target.field
                    )))
                }
                None => {
                    return Err(ServiceError::validation(format!(
                        "unknown field {}.{}",
                        target.model, target.field
                    )))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    fn request(targets: &[(&str, &str)]) -> CreateRuleRequest {
        CreateRuleRequest {
            name: "Priority".to_string(),
            email: "ops@example.com".to_string(),
            mail_server_id: None,
            targets: targets
                .iter()
                .map(|(m, f)| WatchedField::new(*m, *f))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_invalidates_cache() {
        let fx = Fixture::new();
        let rules = fx.ctx.rule_repo();
        fx.ctx.field_cache().snapshot(rules).await.unwrap();
        assert!(fx.ctx.field_cache().is_populated());

        let created = RuleService::new(&fx.ctx)
            .create(request(&[("project.task", "priority")]))
            .await
            .unwrap();
        assert_eq!(created.targets.len(), 1);
        assert!(!fx.ctx.field_cache().is_populated());

        let snapshot = fx.ctx.field_cache().snapshot(rules).await.unwrap();
        assert_eq!(snapshot.rules_for("project.task", "priority"), &[created.id]);
    }

    #[tokio::test]
    async fn test_rejects_bad_targets() {
        let fx = Fixture::new();
        let service = RuleService::new(&fx.ctx);

        let err = service
            .create(request(&[("ir.configuration", "priority")]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = service.create(request(&[("stock.move", "state")])).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = service.create(request(&[("project.task", "nope")])).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = service.create(request(&[("project.task", "write_date")])).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = service
            .create(request(&[("project.task", "priority"), ("project.task", "priority")]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let fx = Fixture::new();
        let service = RuleService::new(&fx.ctx);
        let created = service.create(request(&[("project.task", "priority")])).await.unwrap();

        let updated = service
            .update(
                created.id,
                UpdateRuleRequest {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, "ops@example.com");
        assert_eq!(updated.targets, created.targets);

        let err = service.update(99, UpdateRuleRequest::default()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_delete_unknown_rule() {
        let fx = Fixture::new();
        let err = RuleService::new(&fx.ctx).delete(42).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
