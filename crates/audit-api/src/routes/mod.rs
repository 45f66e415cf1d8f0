//! Route definitions
//!
//! All API routes organized by resource and mounted under /api/v1.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{audit_log, health, mail_servers, models, records, rules, wizard};
use crate::state::AppState;

/// Create the main API router (health routes are mounted separately)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(audit_log_routes())
        .merge(rule_routes())
        .merge(mail_server_routes())
        .merge(record_routes())
        .merge(wizard_routes())
}

/// Model catalog and audit log routes
fn audit_log_routes() -> Router<AppState> {
    Router::new()
        .route("/models", get(models::list_models))
        .route("/audit-log", get(audit_log::get_audit_log))
        .route("/audit-log/report", get(audit_log::get_audit_log_report))
}

/// Notification rule routes
fn rule_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notification-rules",
            get(rules::list_rules).post(rules::create_rule),
        )
        .route(
            "/notification-rules/:rule_id",
            get(rules::get_rule)
                .patch(rules::update_rule)
                .delete(rules::delete_rule),
        )
}

/// Mail server routes
fn mail_server_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/mail-servers",
            get(mail_servers::list_mail_servers).post(mail_servers::create_mail_server),
        )
        .route(
            "/mail-servers/:mail_server_id",
            axum::routing::delete(mail_servers::delete_mail_server),
        )
}

/// Generic record routes
fn record_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/records/:model",
            post(records::create_records)
                .patch(records::write_records)
                .delete(records::delete_records),
        )
        .route("/records/:model/:record_id", get(records::get_record))
}

/// Report wizard routes
fn wizard_routes() -> Router<AppState> {
    Router::new()
        .route("/wizards/audit-log", post(wizard::start_wizard))
        .route("/wizards/audit-log/:session_id", get(wizard::get_wizard))
        .route("/wizards/audit-log/:session_id/open", post(wizard::open_wizard))
        .route("/wizards/audit-log/:session_id/start", post(wizard::revise_wizard))
        .route("/wizards/audit-log/:session_id/print", post(wizard::print_wizard))
}
