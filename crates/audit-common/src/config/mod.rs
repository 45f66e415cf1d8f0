//! Configuration structs

mod app_config;

pub use app_config::{
    parse_utc_offset, AppConfig, AppSettings, CompanyConfig, ConfigError, CorsConfig,
    DatabaseConfig, Environment, JwtConfig, NotificationConfig, RateLimitConfig, RedisConfig,
    ServerConfig, SmtpConfig, WizardConfig, WorkerConfig,
};
