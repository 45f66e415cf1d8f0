//! # audit-common
//!
//! Shared utilities including configuration, error handling, bearer-token
//! authentication, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{Claims, JwtService};
pub use config::{
    parse_utc_offset, AppConfig, AppSettings, CompanyConfig, ConfigError, CorsConfig,
    DatabaseConfig, Environment, JwtConfig, NotificationConfig, RateLimitConfig, RedisConfig,
    ServerConfig, SmtpConfig, WizardConfig, WorkerConfig,
};
pub use error::AppError;
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig, TracingError};
