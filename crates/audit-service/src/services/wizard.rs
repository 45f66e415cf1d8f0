//! Audit log report wizard
//!
//! A short-lived session walking `start -> open_ -> print_ -> end`. Filters
//! are set in `start`, results are computed when opening, and printing
//! renders the report and closes the session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use audit_core::entities::AuditLogQuery;
use audit_core::DomainError;

use crate::dto::AuditLogEntry;
use crate::report::{RenderedReport, ReportFormat};

use super::audit_log::AuditLogService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Wizard state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardState {
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "open_")]
    Open,
    #[serde(rename = "print_")]
    Print,
    #[serde(rename = "end")]
    End,
}

impl WizardState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Open => "open_",
            Self::Print => "print_",
            Self::End => "end",
        }
    }

    fn can_move_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Start, Self::Open)
                | (Self::Open, Self::Start)
                | (Self::Open, Self::Print)
                | (Self::Print, Self::End)
        )
    }

    /// Move to `to`, rejecting transitions the wizard does not offer
    pub fn transition(self, to: Self) -> Result<Self, DomainError> {
        if self.can_move_to(to) {
            Ok(to)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored wizard session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardSession {
    pub id: String,
    pub state: WizardState,
    pub params: AuditLogQuery,
    /// Computed when opening, dropped when revising
    pub results: Option<Vec<AuditLogEntry>>,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Report wizard service
pub struct WizardService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WizardService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Open a new session in `start`
    #[instrument(skip(self, params))]
    pub async fn start(
        &self,
        params: AuditLogQuery,
        user_id: Option<i64>,
    ) -> ServiceResult<WizardSession> {
        let session = WizardSession {
            id: Uuid::new_v4().to_string(),
            state: WizardState::Start,
            params,
            results: None,
            user_id,
            created_at: Utc::now(),
        };
        self.save(&session).await?;

        info!(session_id = %session.id, "Report wizard started");
        Ok(session)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> ServiceResult<WizardSession> {
        self.load(id).await
    }

    /// `start -> open_`: compute the filtered audit log
    #[instrument(skip(self))]
    pub async fn open(&self, id: &str) -> ServiceResult<WizardSession> {
        let mut session = self.load(id).await?;
        let next = session.state.transition(WizardState::Open)?;

        let entries = AuditLogService::new(self.ctx).list(&session.params).await?;
        info!(session_id = %id, count = entries.len(), "Report wizard opened");

        session.state = next;
        session.results = Some(entries);
        self.save(&session).await?;
        Ok(session)
    }

    /// `open_ -> start`: back to the filters, optionally replacing them
    #[instrument(skip(self, params))]
    pub async fn revise(
        &self,
        id: &str,
        params: Option<AuditLogQuery>,
    ) -> ServiceResult<WizardSession> {
        let mut session = self.load(id).await?;
        session.state = session.state.transition(WizardState::Start)?;
        session.results = None;
        if let Some(params) = params {
            session.params = params;
        }
        self.save(&session).await?;
        Ok(session)
    }

    /// `open_ -> print_ -> end`: render the current results and close
    #[instrument(skip(self))]
    pub async fn print(&self, id: &str, format: ReportFormat) -> ServiceResult<RenderedReport> {
        let mut session = self.load(id).await?;
        session.state = session.state.transition(WizardState::Print)?;

        let entries = session.results.take().unwrap_or_default();
        let report = crate::report::render_report(
            format,
            &entries,
            Utc::now(),
            self.ctx.settings().company_offset,
        );

        session.state.transition(WizardState::End)?;
        self.ctx.session_store().remove(id).await?;

        info!(session_id = %id, %format, rows = entries.len(), "Report wizard printed");
        Ok(report)
    }

    async fn load(&self, id: &str) -> ServiceResult<WizardSession> {
        let raw = self
            .ctx
            .session_store()
            .get(id)
            .await?
            .ok_or_else(|| DomainError::WizardSessionNotFound(id.to_string()))?;
        serde_json::from_value(raw)
            .map_err(|e| ServiceError::internal(format!("corrupt wizard session {id}: {e}")))
    }

    async fn save(&self, session: &WizardSession) -> ServiceResult<()> {
        let raw = serde_json::to_value(session)
            .map_err(|e| ServiceError::internal(format!("wizard session encoding: {e}")))?;
        self.ctx.session_store().put(&session.id, raw).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_core::entities::EventType;
    use serde_json::json;

    use crate::services::RecordService;
    use crate::dto::{CreateRecordsRequest, WriteRecordsRequest};
    use crate::testing::Fixture;

    #[test]
    fn test_transitions() {
        assert_eq!(WizardState::Start.transition(WizardState::Open).unwrap(), WizardState::Open);
        assert_eq!(WizardState::Open.transition(WizardState::Start).unwrap(), WizardState::Start);
        assert_eq!(WizardState::Open.transition(WizardState::Print).unwrap(), WizardState::Print);
        assert_eq!(WizardState::Print.transition(WizardState::End).unwrap(), WizardState::End);

        let err = WizardState::Start.transition(WizardState::Print).unwrap_err();
        assert!(err.is_validation());
        assert!(WizardState::End.transition(WizardState::Start).is_err());
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(serde_json::to_value(WizardState::Open).unwrap(), json!("open_"));
        assert_eq!(
            serde_json::from_value::<WizardState>(json!("print_")).unwrap(),
            WizardState::Print
        );
    }

    async fn seed(fx: &Fixture) {
        let records = RecordService::new(&fx.ctx);
        let created = records
            .create(
                "project.task",
                CreateRecordsRequest {
                    rows: vec![Fixture::values(&[("name", json!("Ship it")), ("priority", json!("high"))])],
                },
                Some(1),
            )
            .await
            .unwrap();
        records
            .write(
                "project.task",
                WriteRecordsRequest {
                    ids: created.ids,
                    values: Fixture::values(&[("priority", json!("low"))]),
                },
                Some(1),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_full_walk() {
        let fx = Fixture::new();
        seed(&fx).await;
        let wizard = WizardService::new(&fx.ctx);

        let session = wizard
            .start(
                AuditLogQuery {
                    event_types: vec![EventType::Write],
                    ..Default::default()
                },
                Some(1),
            )
            .await
            .unwrap();
        assert_eq!(session.state, WizardState::Start);

        let opened = wizard.open(&session.id).await.unwrap();
        assert_eq!(opened.state, WizardState::Open);
        let results = opened.results.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].changes, "Priority: high → low");

        let report = wizard.print(&session.id, ReportFormat::Xls).await.unwrap();
        assert!(report.filename.ends_with(".xls"));
        assert!(String::from_utf8(report.bytes).unwrap().contains("Priority: high"));

        let err = wizard.get(&session.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_revise_drops_results() {
        let fx = Fixture::new();
        seed(&fx).await;
        let wizard = WizardService::new(&fx.ctx);

        let session = wizard.start(AuditLogQuery::default(), None).await.unwrap();
        wizard.open(&session.id).await.unwrap();

        let revised = wizard
            .revise(
                &session.id,
                Some(AuditLogQuery {
                    event_types: vec![EventType::Create],
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
        assert_eq!(revised.state, WizardState::Start);
        assert!(revised.results.is_none());

        let reopened = wizard.open(&session.id).await.unwrap();
        let results = reopened.results.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].event_type, EventType::Create);
    }

    #[tokio::test]
    async fn test_print_before_open_rejected() {
        let fx = Fixture::new();
        let wizard = WizardService::new(&fx.ctx);
        let session = wizard.start(AuditLogQuery::default(), None).await.unwrap();

        let err = wizard.print(&session.id, ReportFormat::Pdf).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(wizard.get(&session.id).await.unwrap().state, WizardState::Start);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let fx = Fixture::new();
        let err = WizardService::new(&fx.ctx).open("missing").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
