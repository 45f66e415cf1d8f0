//! Audit log handlers
//!
//! The filtered audit log and its printable report.

use axum::{extract::State, Json};
use audit_service::dto::{ApiResponse, AuditLogEntry, AuditLogParams, ReportParams};
use audit_service::services::AuditLogService;

use crate::extractors::{ApiQuery, AuthUser};
use crate::response::{ApiResult, ReportDownload};
use crate::state::AppState;

/// Get the audit log
///
/// GET /audit-log
pub async fn get_audit_log(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<AuditLogParams>,
) -> ApiResult<Json<ApiResponse<Vec<AuditLogEntry>>>> {
    let query = params.into_query()?;
    let entries = AuditLogService::new(state.service_context())
        .list(&query)
        .await?;
    Ok(Json(ApiResponse::new(entries)))
}

/// Download the audit log as a report
///
/// GET /audit-log/report?format=pdf|xls
pub async fn get_audit_log_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(params): ApiQuery<AuditLogParams>,
    ApiQuery(report): ApiQuery<ReportParams>,
) -> ApiResult<ReportDownload> {
    let query = params.into_query()?;
    let report = AuditLogService::new(state.service_context())
        .report(&query, report.format)
        .await?;
    Ok(ReportDownload(report))
}
