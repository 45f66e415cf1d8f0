//! Mail server service

use tracing::{info, instrument};
use validator::Validate;

use audit_core::entities::NewMailServer;

use crate::dto::MailServerResponse;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Mail server service
pub struct MailServerService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MailServerService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> ServiceResult<Vec<MailServerResponse>> {
        let servers = self.ctx.mail_server_repo().list().await?;
        Ok(servers.into_iter().map(MailServerResponse::from).collect())
    }

    #[instrument(skip(self, request), fields(host = %request.host))]
    pub async fn create(&self, request: NewMailServer) -> ServiceResult<MailServerResponse> {
        request.validate()?;
        let server = self.ctx.mail_server_repo().create(&request).await?;

        info!(mail_server_id = server.id, "Mail server registered");
        Ok(MailServerResponse::from(server))
    }

    /// Delete a mail server; rules bound to it fall back to the default relay
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.ctx.mail_server_repo().delete(id).await?;
        info!(mail_server_id = id, "Mail server deleted");
        Ok(())
    }
}
