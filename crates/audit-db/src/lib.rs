//! # audit-db
//!
//! Database layer implementing the audit-core ports with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management and schema migrations
//! - The `ir_model` registry read as model descriptors
//! - A record store writing `<table>__history` rows for historized models
//! - The virtual audit log, a `UNION ALL` over every stored model
//! - Notification rules, mail servers and users
//!
//! ## Usage
//!
//! ```rust,ignore
//! use audit_db::pool::{create_pool, run_migrations, DatabaseConfig};
//! use audit_db::repositories::PgModelCatalog;
//! use audit_core::traits::ModelCatalog;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from_env()).await?;
//!     run_migrations(&pool).await?;
//!     let catalog = PgModelCatalog::new(pool);
//!     let models = catalog.list_models().await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod query;
pub mod repositories;

// Re-export commonly used types
pub use pool::{
    create_pool, create_pool_from_env, health_check, run_migrations, DatabaseConfig, PgPool,
};
pub use repositories::{
    PgAuditLogRepository, PgMailServerRepository, PgModelCatalog, PgNotificationRuleRepository,
    PgRecordStore, PgUserDirectory,
};
