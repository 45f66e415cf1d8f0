//! Notification delivery service
//!
//! Turns a queued mail task into a sent mail: loads the rule, resolves its
//! relay, renders and dispatches.

use tracing::{info, instrument, warn};

use audit_core::entities::{NotificationTask, QueuedTask};

use crate::mail::NotificationMail;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// What happened to a queued notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// The rule was deleted after the task was queued
    RuleDeleted,
    /// No bound mail server and no default relay
    NoRelay,
}

/// Notification delivery service
pub struct NotificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> NotificationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Decode the payload of a queued task
    pub fn decode(task: &QueuedTask) -> ServiceResult<NotificationTask> {
        serde_json::from_value(task.payload.clone())
            .map_err(|e| ServiceError::validation(format!("malformed notification task: {e}")))
    }

    /// Deliver one queued notification
    #[instrument(skip(self, task), fields(queue = %task.queue, sequence = task.sequence))]
    pub async fn deliver(&self, task: &QueuedTask) -> ServiceResult<DeliveryOutcome> {
        let notification = Self::decode(task)?;

        let Some(rule) = self.ctx.rule_repo().find_by_id(notification.rule_id).await? else {
            info!(rule_id = notification.rule_id, "Notification rule deleted, dropping task");
            return Ok(DeliveryOutcome::RuleDeleted);
        };

        let bound = match rule.mail_server_id {
            Some(id) => {
                let server = self.ctx.mail_server_repo().find_by_id(id).await?;
                if server.is_none() {
                    warn!(rule_id = rule.id, mail_server_id = id, "Bound mail server is gone, using default relay");
                }
                server
            }
            None => None,
        };

        let mail = NotificationMail::render(&notification, &rule.name, self.ctx.settings().company_offset);
        let sent = self
            .ctx
            .mail_dispatcher()
            .dispatch(rule.id, bound.as_ref(), &rule.email, &mail)
            .await?;

        Ok(if sent {
            DeliveryOutcome::Sent
        } else {
            DeliveryOutcome::NoRelay
        })
    }
}
