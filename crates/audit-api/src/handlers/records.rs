//! Record handlers
//!
//! Generic create, write, delete and read of registered models. The
//! authenticated user is recorded as the author of the change.

use axum::{extract::State, Json};
use audit_service::dto::{
    CreateRecordsRequest, CreatedRecordsResponse, DeleteRecordsRequest, ModifiedRecordsResponse,
    RecordResponse, WriteRecordsRequest,
};
use audit_service::services::RecordService;

use crate::extractors::{ApiPath, AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Create records
///
/// POST /records/{model}
pub async fn create_records(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(model): ApiPath<String>,
    ValidatedJson(request): ValidatedJson<CreateRecordsRequest>,
) -> ApiResult<Created<Json<CreatedRecordsResponse>>> {
    let response = RecordService::new(state.service_context())
        .create(&model, request, Some(auth.user_id))
        .await?;
    Ok(Created(Json(response)))
}

/// Write records
///
/// PATCH /records/{model}
pub async fn write_records(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(model): ApiPath<String>,
    ValidatedJson(request): ValidatedJson<WriteRecordsRequest>,
) -> ApiResult<Json<ModifiedRecordsResponse>> {
    let response = RecordService::new(state.service_context())
        .write(&model, request, Some(auth.user_id))
        .await?;
    Ok(Json(response))
}

/// Delete records
///
/// DELETE /records/{model}
pub async fn delete_records(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(model): ApiPath<String>,
    ValidatedJson(request): ValidatedJson<DeleteRecordsRequest>,
) -> ApiResult<Json<ModifiedRecordsResponse>> {
    let response = RecordService::new(state.service_context())
        .delete(&model, request, Some(auth.user_id))
        .await?;
    Ok(Json(response))
}

/// Read one record
///
/// GET /records/{model}/{record_id}
pub async fn get_record(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath((model, record_id)): ApiPath<(String, i64)>,
) -> ApiResult<Json<RecordResponse>> {
    let record = RecordService::new(state.service_context())
        .get(&model, record_id)
        .await?;
    Ok(Json(record))
}
