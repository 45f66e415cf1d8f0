//! Error handling utilities for repositories

use audit_core::error::DomainError;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for a constraint violation and return the matching error or fallback
pub fn map_constraint_violation<U, F>(e: SqlxError, on_unique: U, on_foreign_key: F) -> DomainError
where
    U: FnOnce() -> DomainError,
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
        if db_err.is_foreign_key_violation() {
            return on_foreign_key();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Create a "record not found" error
pub fn record_not_found(model: &str, id: i64) -> DomainError {
    DomainError::RecordNotFound {
        model: model.to_string(),
        id,
    }
}
