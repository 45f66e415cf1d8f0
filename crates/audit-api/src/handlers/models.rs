//! Model catalog handlers

use axum::{extract::State, Json};
use audit_service::dto::{ApiResponse, ModelResponse};
use audit_service::services::CatalogService;

use crate::extractors::AuthUser;
use crate::response::ApiResult;
use crate::state::AppState;

/// List registered models
///
/// GET /models
pub async fn list_models(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<ModelResponse>>>> {
    let models = CatalogService::new(state.service_context()).list_models().await?;
    Ok(Json(ApiResponse::new(models)))
}
