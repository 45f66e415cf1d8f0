//! Service context - dependency container for services
//!
//! Holds the ports implemented by the infrastructure crates, the shared
//! notification field cache and the mail dispatcher.

use std::sync::Arc;

use chrono::{Duration, FixedOffset, Offset, Utc};

use audit_cache::NotificationFieldCache;
use audit_common::{AppConfig, SmtpConfig};
use audit_core::traits::{
    AuditLogRepository, MailServerRepository, ModelCatalog, NotificationRuleRepository,
    RecordStore, SessionStore, TaskQueue, UserDirectory,
};

use crate::mail::MailDispatcher;

use super::error::{ServiceError, ServiceResult};

/// Default queue for notification mails
pub const DEFAULT_NOTIFICATION_QUEUE: &str = "notification_mail";

/// Runtime settings shared by the services
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Queue receiving notification mail tasks
    pub queue_name: String,
    /// Delay before a queued notification becomes due
    pub notification_delay: Duration,
    /// Offset used to localize timestamps in mails and reports
    pub company_offset: FixedOffset,
    /// Default SMTP relay for rules without a bound mail server
    pub smtp: Option<SmtpConfig>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            queue_name: DEFAULT_NOTIFICATION_QUEUE.to_string(),
            notification_delay: Duration::zero(),
            company_offset: Utc.fix(),
            smtp: None,
        }
    }
}

impl From<&AppConfig> for ServiceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            queue_name: config.notification.queue_name.clone(),
            notification_delay: Duration::seconds(config.notification.delay_seconds.max(0)),
            company_offset: config.company.offset(),
            smtp: config.smtp.clone(),
        }
    }
}

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Ports
    catalog: Arc<dyn ModelCatalog>,
    record_store: Arc<dyn RecordStore>,
    audit_log_repo: Arc<dyn AuditLogRepository>,
    rule_repo: Arc<dyn NotificationRuleRepository>,
    mail_server_repo: Arc<dyn MailServerRepository>,
    user_directory: Arc<dyn UserDirectory>,
    task_queue: Arc<dyn TaskQueue>,
    session_store: Arc<dyn SessionStore>,

    // Shared state
    field_cache: Arc<NotificationFieldCache>,
    mail_dispatcher: MailDispatcher,

    settings: ServiceSettings,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn ModelCatalog>,
        record_store: Arc<dyn RecordStore>,
        audit_log_repo: Arc<dyn AuditLogRepository>,
        rule_repo: Arc<dyn NotificationRuleRepository>,
        mail_server_repo: Arc<dyn MailServerRepository>,
        user_directory: Arc<dyn UserDirectory>,
        task_queue: Arc<dyn TaskQueue>,
        session_store: Arc<dyn SessionStore>,
        field_cache: Arc<NotificationFieldCache>,
        mail_dispatcher: MailDispatcher,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            catalog,
            record_store,
            audit_log_repo,
            rule_repo,
            mail_server_repo,
            user_directory,
            task_queue,
            session_store,
            field_cache,
            mail_dispatcher,
            settings,
        }
    }

    // === Ports ===

    /// Get the model catalog
    pub fn catalog(&self) -> &dyn ModelCatalog {
        self.catalog.as_ref()
    }

    /// Get the historized record store
    pub fn record_store(&self) -> &dyn RecordStore {
        self.record_store.as_ref()
    }

    /// Get the audit log repository
    pub fn audit_log_repo(&self) -> &dyn AuditLogRepository {
        self.audit_log_repo.as_ref()
    }

    /// Get the notification rule repository
    pub fn rule_repo(&self) -> &dyn NotificationRuleRepository {
        self.rule_repo.as_ref()
    }

    /// Get the mail server repository
    pub fn mail_server_repo(&self) -> &dyn MailServerRepository {
        self.mail_server_repo.as_ref()
    }

    /// Get the user directory
    pub fn user_directory(&self) -> &dyn UserDirectory {
        self.user_directory.as_ref()
    }

    /// Get the background task queue
    pub fn task_queue(&self) -> &dyn TaskQueue {
        self.task_queue.as_ref()
    }

    /// Get the wizard session store
    pub fn session_store(&self) -> &dyn SessionStore {
        self.session_store.as_ref()
    }

    // === Shared state ===

    /// Get the notification field cache
    pub fn field_cache(&self) -> &NotificationFieldCache {
        self.field_cache.as_ref()
    }

    /// Get the mail dispatcher
    pub fn mail_dispatcher(&self) -> &MailDispatcher {
        &self.mail_dispatcher
    }

    /// Get the runtime settings
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("ports", &"...")
            .field("field_cache_populated", &self.field_cache.is_populated())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    catalog: Option<Arc<dyn ModelCatalog>>,
    record_store: Option<Arc<dyn RecordStore>>,
    audit_log_repo: Option<Arc<dyn AuditLogRepository>>,
    rule_repo: Option<Arc<dyn NotificationRuleRepository>>,
    mail_server_repo: Option<Arc<dyn MailServerRepository>>,
    user_directory: Option<Arc<dyn UserDirectory>>,
    task_queue: Option<Arc<dyn TaskQueue>>,
    session_store: Option<Arc<dyn SessionStore>>,
    field_cache: Option<Arc<NotificationFieldCache>>,
    mail_dispatcher: Option<MailDispatcher>,
    settings: ServiceSettings,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(mut self, catalog: Arc<dyn ModelCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store = Some(store);
        self
    }

    pub fn audit_log_repo(mut self, repo: Arc<dyn AuditLogRepository>) -> Self {
        self.audit_log_repo = Some(repo);
        self
    }

    pub fn rule_repo(mut self, repo: Arc<dyn NotificationRuleRepository>) -> Self {
        self.rule_repo = Some(repo);
        self
    }

    pub fn mail_server_repo(mut self, repo: Arc<dyn MailServerRepository>) -> Self {
        self.mail_server_repo = Some(repo);
        self
    }

    pub fn user_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.user_directory = Some(directory);
        self
    }

    pub fn task_queue(mut self, queue: Arc<dyn TaskQueue>) -> Self {
        self.task_queue = Some(queue);
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Share an existing cache; a fresh one is created otherwise
    pub fn field_cache(mut self, cache: Arc<NotificationFieldCache>) -> Self {
        self.field_cache = Some(cache);
        self
    }

    /// Override the dispatcher; defaults to SMTP with the settings' relay
    pub fn mail_dispatcher(mut self, dispatcher: MailDispatcher) -> Self {
        self.mail_dispatcher = Some(dispatcher);
        self
    }

    pub fn settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let mail_dispatcher = self
            .mail_dispatcher
            .unwrap_or_else(|| MailDispatcher::new(self.settings.smtp.clone()));

        Ok(ServiceContext::new(
            self.catalog.ok_or_else(|| ServiceError::validation("catalog is required"))?,
            self.record_store.ok_or_else(|| ServiceError::validation("record_store is required"))?,
            self.audit_log_repo.ok_or_else(|| ServiceError::validation("audit_log_repo is required"))?,
            self.rule_repo.ok_or_else(|| ServiceError::validation("rule_repo is required"))?,
            self.mail_server_repo.ok_or_else(|| ServiceError::validation("mail_server_repo is required"))?,
            self.user_directory.ok_or_else(|| ServiceError::validation("user_directory is required"))?,
            self.task_queue.ok_or_else(|| ServiceError::validation("task_queue is required"))?,
            self.session_store.ok_or_else(|| ServiceError::validation("session_store is required"))?,
            self.field_cache.unwrap_or_default(),
            mail_dispatcher,
            self.settings,
        ))
    }
}
