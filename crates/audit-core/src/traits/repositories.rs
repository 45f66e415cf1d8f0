//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs from the host application (model
//! reflection, historized record storage, background queue, users) and the
//! infrastructure crates provide the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    AuditEvent, AuditLogQuery, MailServer, ModelDescriptor, NewMailServer, NewNotificationRule,
    NotificationRule, QueuedTask, Record, User, Values,
};
use crate::error::DomainError;
use crate::value_objects::WatchedField;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Model Catalog
// ============================================================================

#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// List registered models whose storage is present, in registry order
    async fn list_models(&self) -> RepoResult<Vec<ModelDescriptor>>;

    /// Find a model by its dotted name
    async fn find_model(&self, name: &str) -> RepoResult<Option<ModelDescriptor>>;
}

// ============================================================================
// Record Store
// ============================================================================

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read live records; missing ids are omitted from the result
    async fn read(&self, model: &ModelDescriptor, ids: &[i64]) -> RepoResult<Vec<Record>>;

    /// Read a historized record as it existed at a point in time
    ///
    /// Returns `None` when the record did not exist at that time or the
    /// model is not historized.
    async fn read_at(
        &self,
        model: &ModelDescriptor,
        id: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Record>>;

    /// Create records, returning their ids in input order
    async fn create(
        &self,
        model: &ModelDescriptor,
        rows: &[Values],
        user_id: Option<i64>,
    ) -> RepoResult<Vec<i64>>;

    /// Write the same values to several records
    async fn write(
        &self,
        model: &ModelDescriptor,
        ids: &[i64],
        values: &Values,
        user_id: Option<i64>,
    ) -> RepoResult<()>;

    /// Delete records
    async fn delete(
        &self,
        model: &ModelDescriptor,
        ids: &[i64],
        user_id: Option<i64>,
    ) -> RepoResult<()>;
}

// ============================================================================
// Audit Log Repository
// ============================================================================

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Union the per-model event subqueries of the given models
    ///
    /// Change summaries are left empty; they are computed by the service layer.
    async fn query_events(
        &self,
        models: &[ModelDescriptor],
        query: &AuditLogQuery,
    ) -> RepoResult<Vec<AuditEvent>>;
}

// ============================================================================
// Notification Rule Repository
// ============================================================================

#[async_trait]
pub trait NotificationRuleRepository: Send + Sync {
    /// List all rules with their targets
    async fn list(&self) -> RepoResult<Vec<NotificationRule>>;

    /// Find rule by ID
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<NotificationRule>>;

    /// Create a rule
    async fn create(&self, rule: &NewNotificationRule) -> RepoResult<NotificationRule>;

    /// Replace a rule's settings and targets
    async fn update(&self, id: i64, rule: &NewNotificationRule) -> RepoResult<NotificationRule>;

    /// Delete a rule
    async fn delete(&self, id: i64) -> RepoResult<()>;

    /// Every watched (model, field) pair with the rule watching it
    async fn list_targets(&self) -> RepoResult<Vec<(WatchedField, i64)>>;
}

// ============================================================================
// Mail Server Repository
// ============================================================================

#[async_trait]
pub trait MailServerRepository: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<MailServer>>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<MailServer>>;

    async fn create(&self, server: &NewMailServer) -> RepoResult<MailServer>;

    /// Delete a mail server; bound rules fall back to the default server
    async fn delete(&self, id: i64) -> RepoResult<()>;
}

// ============================================================================
// User Directory
// ============================================================================

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>>;

    /// Find several users; unknown ids are omitted
    async fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<User>>;
}

// ============================================================================
// Task Queue
// ============================================================================

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueue a task
    async fn enqueue(&self, task: QueuedTask) -> RepoResult<()>;

    /// Remove and return up to `max` tasks of a queue that are due at `now`,
    /// earliest eta first, FIFO among equal etas
    async fn dequeue_due(
        &self,
        queue: &str,
        now: DateTime<Utc>,
        max: usize,
    ) -> RepoResult<Vec<QueuedTask>>;
}

// ============================================================================
// Session Store
// ============================================================================

/// Short-lived keyed state, expired by the store
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace a session, restarting its time to live
    async fn put(&self, id: &str, state: serde_json::Value) -> RepoResult<()>;

    async fn get(&self, id: &str) -> RepoResult<Option<serde_json::Value>>;

    /// Remove a session; removing an unknown id is not an error
    async fn remove(&self, id: &str) -> RepoResult<()>;
}
