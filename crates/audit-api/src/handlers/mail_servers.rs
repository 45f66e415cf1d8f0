//! Mail server handlers

use axum::{extract::State, Json};
use audit_core::entities::NewMailServer;
use audit_service::dto::{ApiResponse, MailServerResponse};
use audit_service::services::MailServerService;

use crate::extractors::{AdminUser, ApiPath, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// List mail servers
///
/// GET /mail-servers
pub async fn list_mail_servers(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<ApiResponse<Vec<MailServerResponse>>>> {
    let servers = MailServerService::new(state.service_context()).list().await?;
    Ok(Json(ApiResponse::new(servers)))
}

/// Register a mail server
///
/// POST /mail-servers
pub async fn create_mail_server(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(request): ValidatedJson<NewMailServer>,
) -> ApiResult<Created<Json<MailServerResponse>>> {
    let server = MailServerService::new(state.service_context())
        .create(request)
        .await?;
    Ok(Created(Json(server)))
}

/// Delete a mail server
///
/// DELETE /mail-servers/{mail_server_id}
pub async fn delete_mail_server(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(mail_server_id): ApiPath<i64>,
) -> ApiResult<NoContent> {
    MailServerService::new(state.service_context())
        .delete(mail_server_id)
        .await?;
    Ok(NoContent)
}
