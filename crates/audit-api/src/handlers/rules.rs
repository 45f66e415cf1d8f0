//! Notification rule handlers
//!
//! Reading rules needs an authenticated user; changing them needs an
//! administrator.

use axum::{extract::State, Json};
use audit_service::dto::{ApiResponse, CreateRuleRequest, RuleResponse, UpdateRuleRequest};
use audit_service::services::RuleService;

use crate::extractors::{AdminUser, ApiPath, AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// List notification rules
///
/// GET /notification-rules
pub async fn list_rules(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<RuleResponse>>>> {
    let rules = RuleService::new(state.service_context()).list().await?;
    Ok(Json(ApiResponse::new(rules)))
}

/// Create a notification rule
///
/// POST /notification-rules
pub async fn create_rule(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateRuleRequest>,
) -> ApiResult<Created<Json<RuleResponse>>> {
    let rule = RuleService::new(state.service_context()).create(request).await?;
    Ok(Created(Json(rule)))
}

/// Get a notification rule
///
/// GET /notification-rules/{rule_id}
pub async fn get_rule(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath(rule_id): ApiPath<i64>,
) -> ApiResult<Json<RuleResponse>> {
    let rule = RuleService::new(state.service_context()).get(rule_id).await?;
    Ok(Json(rule))
}

/// Update a notification rule
///
/// PATCH /notification-rules/{rule_id}
pub async fn update_rule(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(rule_id): ApiPath<i64>,
    ValidatedJson(request): ValidatedJson<UpdateRuleRequest>,
) -> ApiResult<Json<RuleResponse>> {
    let rule = RuleService::new(state.service_context())
        .update(rule_id, request)
        .await?;
    Ok(Json(rule))
}

/// Delete a notification rule
///
/// DELETE /notification-rules/{rule_id}
pub async fn delete_rule(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(rule_id): ApiPath<i64>,
) -> ApiResult<NoContent> {
    RuleService::new(state.service_context()).delete(rule_id).await?;
    Ok(NoContent)
}
