//! Record service
//!
//! Generic create, write, delete and read of registered models. Creates and
//! writes go through the field-watch interceptor.

use tracing::{info, instrument};

use audit_core::DomainError;

use crate::dto::{
    CreateRecordsRequest, CreatedRecordsResponse, DeleteRecordsRequest, ModifiedRecordsResponse,
    RecordResponse, WriteRecordsRequest,
};

use super::catalog::CatalogService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::watch::FieldWatchInterceptor;

/// Record service
pub struct RecordService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RecordService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create records of a model
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        model: &str,
        request: CreateRecordsRequest,
        user_id: Option<i64>,
    ) -> ServiceResult<CreatedRecordsResponse> {
        validator::Validate::validate(&request)?;
        let model = CatalogService::new(self.ctx).model(model).await?;

        let outcome = FieldWatchInterceptor::new(self.ctx)
            .create(&model, &request.rows, user_id)
            .await?;

        info!(model = %model.name, count = outcome.value.len(), "Records created");
        Ok(CreatedRecordsResponse {
            ids: outcome.value,
            notifications_enqueued: outcome.notifications,
        })
    }

    /// Write the same values to records of a model
    #[instrument(skip(self, request))]
    pub async fn write(
        &self,
        model: &str,
        request: WriteRecordsRequest,
        user_id: Option<i64>,
    ) -> ServiceResult<ModifiedRecordsResponse> {
        validator::Validate::validate(&request)?;
        let model = CatalogService::new(self.ctx).model(model).await?;

        let outcome = FieldWatchInterceptor::new(self.ctx)
            .write(&model, &request.ids, &request.values, user_id)
            .await?;

        info!(model = %model.name, count = request.ids.len(), "Records written");
        Ok(ModifiedRecordsResponse {
            count: request.ids.len(),
            notifications_enqueued: outcome.notifications,
        })
    }

    /// Delete records of a model
    #[instrument(skip(self, request))]
    pub async fn delete(
        &self,
        model: &str,
        request: DeleteRecordsRequest,
        user_id: Option<i64>,
    ) -> ServiceResult<ModifiedRecordsResponse> {
        validator::Validate::validate(&request)?;
        let model = CatalogService::new(self.ctx).model(model).await?;

        FieldWatchInterceptor::new(self.ctx)
            .delete(&model, &request.ids, user_id)
            .await?;

        info!(model = %model.name, count = request.ids.len(), "Records deleted");
        Ok(ModifiedRecordsResponse {
            count: request.ids.len(),
            notifications_enqueued: 0,
        })
    }

    /// Read one live record
    #[instrument(skip(self))]
    pub async fn get(&self, model: &str, id: i64) -> ServiceResult<RecordResponse> {
        let model = CatalogService::new(self.ctx).model(model).await?;
        let record = self
            .ctx
            .record_store()
            .read(&model, &[id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::RecordNotFound {
                model: model.name.clone(),
                id,
            })?;
        Ok(RecordResponse::from(record))
    }
}
