//! Notification mail worker entry point
//!
//! Run with:
//! ```bash
//! cargo run -p audit-worker
//! ```
//!
//! Configuration is loaded from environment variables or a `.env` file.

use audit_common::{try_init_tracing, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    if let Err(e) = try_init_tracing(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        queue = %config.notification.queue_name,
        "Starting notification mail worker..."
    );

    if let Err(e) = audit_worker::run(config).await {
        error!(error = %e, "Worker failed to start");
        std::process::exit(1);
    }
}
