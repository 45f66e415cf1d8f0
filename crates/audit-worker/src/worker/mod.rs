//! Notification mail worker
//!
//! Pops due tasks from the queue and hands each to the delivery service.
//! A failed delivery is logged and the task is dropped.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use audit_cache::{RedisPool, RedisTaskQueue, WizardSessionStore};
use audit_common::{AppConfig, AppError};
use audit_db::{
    create_pool, PgAuditLogRepository, PgMailServerRepository, PgModelCatalog,
    PgNotificationRuleRepository, PgRecordStore, PgUserDirectory,
};
use audit_service::services::{
    DeliveryOutcome, NotificationService, ServiceContext, ServiceContextBuilder, ServiceSettings,
};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

/// Worker settings
#[derive(Debug, Clone)]
pub struct MailWorkerConfig {
    pub queue_name: String,
    pub poll_interval: Duration,
    /// Tasks popped per poll
    pub batch_size: usize,
}

impl From<&AppConfig> for MailWorkerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            queue_name: config.notification.queue_name.clone(),
            poll_interval: Duration::from_millis(config.worker.poll_interval_ms.max(1)),
            batch_size: config.worker.batch_size.max(1),
        }
    }
}

/// Counts for one poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub sent: usize,
    /// Rule deleted or no relay available
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.sent + self.skipped + self.failed
    }
}

/// Notification mail worker
pub struct MailWorker {
    ctx: Arc<ServiceContext>,
    config: MailWorkerConfig,
    /// Tasks handled since start
    processed: AtomicU64,
}

impl MailWorker {
    pub fn new(ctx: Arc<ServiceContext>, config: MailWorkerConfig) -> Self {
        Self {
            ctx,
            config,
            processed: AtomicU64::new(0),
        }
    }

    /// Tasks handled since start
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Deliver every task due now, up to one batch
    #[instrument(skip(self), fields(queue = %self.config.queue_name))]
    pub async fn run_once(&self) -> BatchReport {
        let mut report = BatchReport::default();

        let tasks = match self
            .ctx
            .task_queue()
            .dequeue_due(&self.config.queue_name, Utc::now(), self.config.batch_size)
            .await
        {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "Failed to poll notification queue");
                return report;
            }
        };

        let service = NotificationService::new(&self.ctx);
        for task in &tasks {
            match service.deliver(task).await {
                Ok(DeliveryOutcome::Sent) => report.sent += 1,
                Ok(DeliveryOutcome::RuleDeleted | DeliveryOutcome::NoRelay) => report.skipped += 1,
                Err(e) => {
                    error!(sequence = task.sequence, error = %e, "Notification delivery failed, dropping task");
                    report.failed += 1;
                }
            }
        }

        self.processed
            .fetch_add(report.total() as u64, Ordering::Relaxed);
        if report.total() > 0 {
            info!(
                sent = report.sent,
                skipped = report.skipped,
                failed = report.failed,
                "Notification batch handled"
            );
        }
        report
    }

    /// Poll until `shutdown` resolves
    ///
    /// A full batch is followed by another poll right away. `shutdown` is
    /// checked between every two polls.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        info!(
            queue = %self.config.queue_name,
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "Notification worker started"
        );

        loop {
            let report = self.run_once().await;
            let pause = if report.total() >= self.config.batch_size {
                debug!("Queue backlog, polling again");
                Duration::ZERO
            } else {
                self.config.poll_interval
            };

            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(pause) => {}
            }
        }

        info!(processed = self.processed(), "Notification worker stopped");
    }
}

/// Wire the worker against PostgreSQL and Redis
pub async fn create_worker(config: &AppConfig) -> Result<MailWorker, AppError> {
    info!("Connecting to PostgreSQL...");
    let db_config = audit_db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        ..Default::default()
    };
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    info!("Connecting to Redis...");
    let redis_pool =
        RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;

    let catalog = PgModelCatalog::new(pool.clone());
    let service_context = ServiceContextBuilder::new()
        .record_store(Arc::new(PgRecordStore::new(pool.clone(), catalog.clone())))
        .catalog(Arc::new(catalog))
        .audit_log_repo(Arc::new(PgAuditLogRepository::new(pool.clone())))
        .rule_repo(Arc::new(PgNotificationRuleRepository::new(pool.clone())))
        .mail_server_repo(Arc::new(PgMailServerRepository::new(pool.clone())))
        .user_directory(Arc::new(PgUserDirectory::new(pool)))
        .task_queue(Arc::new(RedisTaskQueue::new(redis_pool.clone())))
        .session_store(Arc::new(WizardSessionStore::with_ttl(
            redis_pool,
            config.wizard.session_ttl,
        )))
        .settings(ServiceSettings::from(config))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(MailWorker::new(
        Arc::new(service_context),
        MailWorkerConfig::from(config),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the worker until Ctrl+C
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let worker = create_worker(&config).await?;
    worker.run_until(shutdown_signal()).await;
    Ok(())
}
