//! # audit-core
//!
//! Domain layer containing the model registry, records, audit events,
//! notification rules, value objects and the ports (traits) implemented by
//! the infrastructure crates.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    AuditEvent, AuditLogQuery, EventType, FieldDescriptor, FieldKind, FieldValue, MailServer,
    MailTls, ModelDescriptor, NewMailServer, NewNotificationRule, NotificationRule,
    NotificationTask, QueuedTask, Record, RecordRef, SelectionOption, StagedChange, User, Values,
    AUDIT_METADATA_FIELDS,
};
pub use error::DomainError;
pub use traits::{
    AuditLogRepository, MailServerRepository, ModelCatalog, NotificationRuleRepository,
    RecordStore, RepoResult, SessionStore, TaskQueue, UserDirectory,
};
pub use value_objects::{EventKey, EventKeyParseError, WatchedField};
