//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize`; those carrying free input also
//! implement `Validate`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use validator::Validate;

use audit_core::entities::{AuditLogQuery, EventType, NewNotificationRule, Values};
use audit_core::value_objects::WatchedField;

use crate::report::ReportFormat;
use crate::services::error::{ServiceError, ServiceResult};

/// Upper bound of an audit log page
pub const MAX_AUDIT_LOG_LIMIT: i64 = 10_000;

// ============================================================================
// Audit Log Requests
// ============================================================================

/// Audit log query string
///
/// `user`, `type` and `model` accept comma separated lists.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AuditLogParams {
    pub user: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub model: Option<String>,
    /// Free-text filter over change summaries
    pub q: Option<String>,
    #[validate(range(min = 1, max = 10000, message = "limit must be between 1 and 10000"))]
    pub limit: Option<i64>,
}

fn comma_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.into_iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl AuditLogParams {
    /// Parse into a domain query
    pub fn into_query(self) -> ServiceResult<AuditLogQuery> {
        self.validate()?;

        let users = comma_list(self.user.as_deref())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| ServiceError::validation(format!("invalid user id: {s}")))
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        let event_types = comma_list(self.event_type.as_deref())
            .map(|s| s.parse::<EventType>().map_err(ServiceError::validation))
            .collect::<ServiceResult<Vec<_>>>()?;

        let models = comma_list(self.model.as_deref()).map(str::to_string).collect();

        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ServiceError::validation("from must not be after to"));
            }
        }

        Ok(AuditLogQuery {
            users,
            from: self.from,
            to: self.to,
            event_types,
            models,
            changes: self.q,
            limit: self.limit,
        })
    }
}

/// Report output selection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub format: ReportFormat,
}

// ============================================================================
// Notification Rule Requests
// ============================================================================

/// Create notification rule request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRuleRequest {
    #[validate(length(min = 1, max = 128, message = "Rule name must be 1-128 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub mail_server_id: Option<i64>,

    #[validate(length(min = 1, message = "At least one watched field is required"))]
    pub targets: Vec<WatchedField>,
}

impl From<CreateRuleRequest> for NewNotificationRule {
    fn from(req: CreateRuleRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            mail_server_id: req.mail_server_id,
            targets: req.targets,
        }
    }
}

/// Distinguishes an absent field from an explicit `null`
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update of a notification rule
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRuleRequest {
    #[validate(length(min = 1, max = 128, message = "Rule name must be 1-128 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// `null` unbinds the mail server
    #[serde(default, deserialize_with = "double_option")]
    pub mail_server_id: Option<Option<i64>>,

    #[validate(length(min = 1, message = "At least one watched field is required"))]
    pub targets: Option<Vec<WatchedField>>,
}

// ============================================================================
// Record Requests
// ============================================================================

/// Create records request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRecordsRequest {
    #[validate(length(min = 1, message = "At least one row is required"))]
    pub rows: Vec<Values>,
}

/// Write the same values to several records
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WriteRecordsRequest {
    #[validate(length(min = 1, message = "At least one id is required"))]
    pub ids: Vec<i64>,
    pub values: Values,
}

/// Delete records request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeleteRecordsRequest {
    #[validate(length(min = 1, message = "At least one id is required"))]
    pub ids: Vec<i64>,
}

// ============================================================================
// Wizard Requests
// ============================================================================

/// Print step of the report wizard
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PrintWizardRequest {
    #[serde(default)]
    pub format: ReportFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_parse_comma_lists() {
        let params = AuditLogParams {
            user: Some("1, 2".to_string()),
            event_type: Some("write,delete".to_string()),
            model: Some("project.task,,sale.order".to_string()),
            q: Some("priority".to_string()),
            limit: Some(50),
            ..Default::default()
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.users, vec![1, 2]);
        assert_eq!(query.event_types, vec![EventType::Write, EventType::Delete]);
        assert_eq!(query.models, vec!["project.task", "sale.order"]);
        assert_eq!(query.changes_filter(), Some("priority"));
        assert_eq!(query.limit, Some(50));
    }

    #[test]
    fn test_params_reject_bad_input() {
        let bad_type = AuditLogParams {
            event_type: Some("update".to_string()),
            ..Default::default()
        };
        assert!(bad_type.into_query().is_err());

        let bad_user = AuditLogParams {
            user: Some("alice".to_string()),
            ..Default::default()
        };
        assert!(bad_user.into_query().is_err());

        let bad_limit = AuditLogParams {
            limit: Some(0),
            ..Default::default()
        };
        assert!(bad_limit.into_query().is_err());

        let reversed = AuditLogParams {
            from: Some(Utc::now()),
            to: Some(Utc::now() - chrono::Duration::hours(1)),
            ..Default::default()
        };
        assert!(reversed.into_query().is_err());
    }

    #[test]
    fn test_update_rule_distinguishes_null() {
        let absent: UpdateRuleRequest = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(absent.mail_server_id, None);

        let cleared: UpdateRuleRequest = serde_json::from_str(r#"{"mail_server_id":null}"#).unwrap();
        assert_eq!(cleared.mail_server_id, Some(None));

        let bound: UpdateRuleRequest = serde_json::from_str(r#"{"mail_server_id":3}"#).unwrap();
        assert_eq!(bound.mail_server_id, Some(Some(3)));
    }

    #[test]
    fn test_create_rule_validation() {
        let req: CreateRuleRequest = serde_json::from_str(
            r#"{"name":"Priority","email":"ops@example.com","targets":[{"model":"project.task","field":"priority"}]}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());

        let rule = NewNotificationRule::from(req);
        assert_eq!(rule.targets[0], WatchedField::new("project.task", "priority"));
    }
}
