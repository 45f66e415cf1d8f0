//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Field not found: {model}.{field}")]
    FieldNotFound { model: String, field: String },

    #[error("Record not found: {model},{id}")]
    RecordNotFound { model: String, id: i64 },

    #[error("Notification rule not found: {0}")]
    RuleNotFound(i64),

    #[error("Mail server not found: {0}")]
    MailServerNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Wizard session not found: {0}")]
    WizardSessionNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Field {0} cannot be written directly")]
    ReadOnlyField(String),

    #[error("Model {0} is computed and has no storage")]
    ComputedModel(String),

    #[error("Invalid wizard transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Notification rule already watches {model}.{field}")]
    DuplicateTarget { model: String, field: String },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Queue error: {0}")]
    QueueError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::ModelNotFound(_) => "UNKNOWN_MODEL",
            Self::FieldNotFound { .. } => "UNKNOWN_FIELD",
            Self::RecordNotFound { .. } => "UNKNOWN_RECORD",
            Self::RuleNotFound(_) => "UNKNOWN_NOTIFICATION_RULE",
            Self::MailServerNotFound(_) => "UNKNOWN_MAIL_SERVER",
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::WizardSessionNotFound(_) => "UNKNOWN_WIZARD_SESSION",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidFieldValue { .. } => "INVALID_FIELD_VALUE",
            Self::ReadOnlyField(_) => "READ_ONLY_FIELD",
            Self::ComputedModel(_) => "COMPUTED_MODEL",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",

            // Conflict
            Self::DuplicateTarget { .. } => "DUPLICATE_TARGET",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::QueueError(_) => "QUEUE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_)
                | Self::FieldNotFound { .. }
                | Self::RecordNotFound { .. }
                | Self::RuleNotFound(_)
                | Self::MailServerNotFound(_)
                | Self::UserNotFound(_)
                | Self::WizardSessionNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidFieldValue { .. }
                | Self::ReadOnlyField(_)
                | Self::ComputedModel(_)
                | Self::InvalidTransition { .. }
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        false
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateTarget { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::ModelNotFound("sale.order".to_string());
        assert_eq!(err.code(), "UNKNOWN_MODEL");

        let err = DomainError::InvalidTransition {
            from: "start".to_string(),
            to: "print_".to_string(),
        };
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[test]
    fn test_is_not_found() {
        assert!(DomainError::RuleNotFound(1).is_not_found());
        assert!(DomainError::RecordNotFound {
            model: "party.party".to_string(),
            id: 3
        }
        .is_not_found());
        assert!(!DomainError::ValidationError("x".to_string()).is_not_found());
    }

    #[test]
    fn test_is_validation() {
        assert!(DomainError::ReadOnlyField("create_date".to_string()).is_validation());
        assert!(DomainError::ComputedModel("ir.audit.log".to_string()).is_validation());
        assert!(!DomainError::DatabaseError("boom".to_string()).is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::FieldNotFound {
            model: "sale.order".to_string(),
            field: "priority".to_string(),
        };
        assert_eq!(err.to_string(), "Field not found: sale.order.priority");

        let err = DomainError::RecordNotFound {
            model: "sale.order".to_string(),
            id: 42,
        };
        assert_eq!(err.to_string(), "Record not found: sale.order,42");
    }
}
