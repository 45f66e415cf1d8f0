//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::net::SocketAddr;
use std::sync::Arc;

use audit_cache::{RedisPool, RedisTaskQueue, WizardSessionStore};
use audit_common::{AppConfig, AppError};
use audit_db::{
    create_pool, run_migrations, PgAuditLogRepository, PgMailServerRepository, PgModelCatalog,
    PgNotificationRuleRepository, PgRecordStore, PgUserDirectory,
};
use audit_service::services::{ServiceContextBuilder, ServiceSettings};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
///
/// Health routes stay outside the rate limiter.
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let api = apply_middleware(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    );

    Router::new()
        .merge(health_routes())
        .merge(api)
        .with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    // Create database pool
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
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    // Create Redis pool
    info!("Connecting to Redis...");
    let redis_pool =
        RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
    info!("Redis pool ready");

    // Create repositories
    let catalog = PgModelCatalog::new(pool.clone());
    let record_store = Arc::new(PgRecordStore::new(pool.clone(), catalog.clone()));
    let audit_log_repo = Arc::new(PgAuditLogRepository::new(pool.clone()));
    let rule_repo = Arc::new(PgNotificationRuleRepository::new(pool.clone()));
    let mail_server_repo = Arc::new(PgMailServerRepository::new(pool.clone()));
    let user_directory = Arc::new(PgUserDirectory::new(pool.clone()));
    let task_queue = Arc::new(RedisTaskQueue::new(redis_pool.clone()));
    let session_store = Arc::new(WizardSessionStore::with_ttl(
        redis_pool.clone(),
        config.wizard.session_ttl,
    ));

    // Build service context
    let service_context = ServiceContextBuilder::new()
        .catalog(Arc::new(catalog))
        .record_store(record_store)
        .audit_log_repo(audit_log_repo)
        .rule_repo(rule_repo)
        .mail_server_repo(mail_server_repo)
        .user_directory(user_directory)
        .task_queue(task_queue)
        .session_store(session_store)
        .settings(ServiceSettings::from(&config))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config, pool, redis_pool))
}

/// Run the HTTP server until Ctrl+C
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid API address: {e}")))?;

    let state = create_app_state(config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}
