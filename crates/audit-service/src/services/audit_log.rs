//! Audit log service
//!
//! Queries the virtual audit log, explains write events with change
//! summaries and resolves users, models and records for display.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, Utc};
use tracing::{debug, instrument, warn};

use audit_core::entities::{AuditEvent, AuditLogQuery, ModelDescriptor};

use crate::dto::AuditLogEntry;
use crate::render::format_timestamp;
use crate::report::{render_report, RenderedReport, ReportFormat};

use super::changes::ChangeService;
use super::context::ServiceContext;
use super::error::ServiceResult;

/// Audit log service
pub struct AuditLogService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuditLogService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Filtered audit log, newest first
    ///
    /// With a free-text filter the limit applies after filtering, so the
    /// underlying query runs unbounded.
    #[instrument(skip(self, query))]
    pub async fn list(&self, query: &AuditLogQuery) -> ServiceResult<Vec<AuditLogEntry>> {
        let models = self.ctx.catalog().list_models().await?;
        let needle = query.changes_filter().map(str::to_lowercase);

        let mut events = if needle.is_some() {
            let unbounded = AuditLogQuery {
                limit: None,
                ..query.clone()
            };
            self.ctx.audit_log_repo().query_events(&models, &unbounded).await?
        } else {
            self.ctx.audit_log_repo().query_events(&models, query).await?
        };

        let by_name: HashMap<&str, &ModelDescriptor> =
            models.iter().map(|m| (m.name.as_str(), m)).collect();

        let changes = ChangeService::new(self.ctx);
        for event in &mut events {
            if let Some(model) = by_name.get(event.model.as_str()) {
                event.changes = changes.changes_for(model, event).await;
            }
        }

        if let Some(needle) = needle {
            events.retain(|e| e.changes.to_lowercase().contains(&needle));
        }
        events.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(limit) = query.limit {
            events.truncate(usize::try_from(limit).unwrap_or(0));
        }

        debug!(count = events.len(), "Audit log resolved");
        self.resolve(events, &by_name).await
    }

    /// Render the filtered audit log as a report
    #[instrument(skip(self, query))]
    pub async fn report(
        &self,
        query: &AuditLogQuery,
        format: ReportFormat,
    ) -> ServiceResult<RenderedReport> {
        let entries = self.list(query).await?;
        Ok(render_report(
            format,
            &entries,
            Utc::now(),
            self.ctx.settings().company_offset,
        ))
    }

    async fn resolve(
        &self,
        events: Vec<AuditEvent>,
        models: &HashMap<&str, &ModelDescriptor>,
    ) -> ServiceResult<Vec<AuditLogEntry>> {
        let user_names = self.user_names(&events).await?;
        let record_names = self.record_names(&events, models).await;
        let offset = self.ctx.settings().company_offset;

        Ok(events
            .into_iter()
            .map(|event| {
                let user_name = match event.user_id {
                    Some(id) => user_names
                        .get(&id)
                        .cloned()
                        .unwrap_or_else(|| id.to_string()),
                    None => String::new(),
                };
                let model = models.get(event.model.as_str());
                let model_label = model.map_or_else(|| event.model.clone(), |m| m.label.clone());
                let record_name = record_names
                    .get(&(event.model.clone(), event.record_id))
                    .cloned()
                    .unwrap_or_else(|| format!("{},{}", event.model, event.record_id));

                AuditLogEntry {
                    key: event.key(),
                    event_type: event.event_type,
                    event_label: event.event_type.label().to_string(),
                    user_id: event.user_id,
                    user_name,
                    date: event.date,
                    date_display: format_timestamp(event.date, offset),
                    model: event.model,
                    model_label,
                    record_id: event.record_id,
                    record_name,
                    history: event.history,
                    changes: event.changes,
                }
            })
            .collect())
    }

    async fn user_names(&self, events: &[AuditEvent]) -> ServiceResult<HashMap<i64, String>> {
        let mut ids: Vec<i64> = events.iter().filter_map(|e| e.user_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let users = self.ctx.user_directory().find_by_ids(&ids).await?;
        Ok(users
            .into_iter()
            .map(|u| (u.id, u.display_name().to_string()))
            .collect())
    }

    /// Display names of the events' records
    ///
    /// Live records are read in one batch per model. Deleted records of
    /// historized models are named after their last state.
    async fn record_names(
        &self,
        events: &[AuditEvent],
        models: &HashMap<&str, &ModelDescriptor>,
    ) -> HashMap<(String, i64), String> {
        let mut ids_by_model: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
        for event in events {
            ids_by_model
                .entry(event.model.as_str())
                .or_default()
                .push(event.record_id);
        }

        let store = self.ctx.record_store();
        let mut names = HashMap::new();

        for (name, mut ids) in ids_by_model {
            let Some(model) = models.get(name) else {
                continue;
            };
            ids.sort_unstable();
            ids.dedup();

            match store.read(model, &ids).await {
                Ok(records) => {
                    for record in records {
                        names.insert((record.model.clone(), record.id), record.display_name);
                    }
                }
                Err(e) => warn!(model = %name, error = %e, "Failed to read audited records"),
            }
        }

        for event in events {
            let key = (event.model.clone(), event.record_id);
            if names.contains_key(&key) {
                continue;
            }
            let Some(model) = models.get(event.model.as_str()) else {
                continue;
            };
            if !model.history {
                continue;
            }
            let at = event.date - Duration::microseconds(1);
            match store.read_at(model, event.record_id, at).await {
                Ok(Some(record)) => {
                    names.insert(key, record.display_name);
                }
                Ok(None) => {}
                Err(e) => warn!(model = %event.model, id = event.record_id, error = %e, "Failed to read historized record"),
            }
        }

        names
    }
}
