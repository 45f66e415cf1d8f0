//! Model catalog service
//!
//! Lists the registered models offered as selection sources.

use tracing::instrument;

use audit_core::entities::ModelDescriptor;
use audit_core::DomainError;

use crate::dto::ModelResponse;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Catalog service
pub struct CatalogService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CatalogService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Registered models with their fields
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> ServiceResult<Vec<ModelResponse>> {
        let models = self.ctx.catalog().list_models().await?;
        Ok(models.iter().map(ModelResponse::from).collect())
    }

    /// Find a model by name
    pub async fn model(&self, name: &str) -> ServiceResult<ModelDescriptor> {
        Ok(self
            .ctx
            .catalog()
            .find_model(name)
            .await?
            .ok_or_else(|| DomainError::ModelNotFound(name.to_string()))?)
    }
}
