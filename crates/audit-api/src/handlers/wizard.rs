//! Report wizard handlers
//!
//! Each endpoint performs one transition of a wizard session.

use axum::{extract::State, Json};
use audit_service::dto::{AuditLogParams, PrintWizardRequest, WizardResponse};
use audit_service::services::WizardService;

use crate::extractors::{ApiPath, AuthUser, OptionalValidatedJson, ValidatedJson};
use crate::response::{ApiResult, Created, ReportDownload};
use crate::state::AppState;

/// Start a wizard session with its filters
///
/// POST /wizards/audit-log
pub async fn start_wizard(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(params): ValidatedJson<AuditLogParams>,
) -> ApiResult<Created<Json<WizardResponse>>> {
    let query = params.into_query()?;
    let session = WizardService::new(state.service_context())
        .start(query, Some(auth.user_id))
        .await?;
    Ok(Created(Json(WizardResponse::from(session))))
}

/// Get a wizard session
///
/// GET /wizards/audit-log/{session_id}
pub async fn get_wizard(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath(session_id): ApiPath<String>,
) -> ApiResult<Json<WizardResponse>> {
    let session = WizardService::new(state.service_context())
        .get(&session_id)
        .await?;
    Ok(Json(WizardResponse::from(session)))
}

/// Compute the results
///
/// POST /wizards/audit-log/{session_id}/open
pub async fn open_wizard(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath(session_id): ApiPath<String>,
) -> ApiResult<Json<WizardResponse>> {
    let session = WizardService::new(state.service_context())
        .open(&session_id)
        .await?;
    Ok(Json(WizardResponse::from(session)))
}

/// Go back to the filters, optionally replacing them
///
/// POST /wizards/audit-log/{session_id}/start
pub async fn revise_wizard(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath(session_id): ApiPath<String>,
    OptionalValidatedJson(params): OptionalValidatedJson<AuditLogParams>,
) -> ApiResult<Json<WizardResponse>> {
    let query = params.map(AuditLogParams::into_query).transpose()?;
    let session = WizardService::new(state.service_context())
        .revise(&session_id, query)
        .await?;
    Ok(Json(WizardResponse::from(session)))
}

/// Render the report and close the session
///
/// POST /wizards/audit-log/{session_id}/print
pub async fn print_wizard(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath(session_id): ApiPath<String>,
    OptionalValidatedJson(request): OptionalValidatedJson<PrintWizardRequest>,
) -> ApiResult<ReportDownload> {
    let format = request.unwrap_or_default().format;
    let report = WizardService::new(state.service_context())
        .print(&session_id, format)
        .await?;
    Ok(ReportDownload(report))
}
