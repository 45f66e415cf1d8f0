//! Field-watch interceptor
//!
//! Wraps record-store create and write. Changes to fields watched by a
//! notification rule are staged, then grouped by rule and handed to the
//! task queue as one mail task per rule. Deletes pass through.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use audit_cache::WatchSnapshot;
use audit_core::entities::{
    FieldDescriptor, ModelDescriptor, NotificationTask, QueuedTask, Record,
    StagedChange, Values,
};

use crate::render::display_value;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Namespaces of bookkeeping models never intercepted
pub const EXCLUDED_MODEL_PREFIXES: [&str; 4] = ["ir.", "res.", "notification.", "mail."];

/// Whether a model belongs to an excluded namespace
pub fn is_excluded(model: &str) -> bool {
    EXCLUDED_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Result of an intercepted operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intercepted<T> {
    pub value: T,
    /// Mail tasks enqueued for the operation
    pub notifications: usize,
}

impl<T> Intercepted<T> {
    fn passthrough(value: T) -> Self {
        Self {
            value,
            notifications: 0,
        }
    }
}

/// A create value that leaves the field unset: null or an empty list
fn is_unset(raw: &serde_json::Value) -> bool {
    raw.is_null() || raw.as_array().is_some_and(Vec::is_empty)
}

fn normalized(field: &FieldDescriptor, record: &Record) -> Option<String> {
    record
        .get(&field.name)
        .map(|value| display_value(&field.kind, value))
}

/// Swap the negative row counters of creation entries for the created records
///
/// Key `-(i + 1)` refers to row `i` of the create call.
pub fn resolve_created(
    staged: Vec<StagedChange>,
    ids: &[i64],
    records: &HashMap<i64, Record>,
    fields: &[&FieldDescriptor],
) -> Vec<StagedChange> {
    staged
        .into_iter()
        .filter_map(|mut change| {
            let row = usize::try_from(-change.record_key - 1).ok()?;
            let id = *ids.get(row)?;
            let record = records.get(&id)?;
            if let Some(field) = fields.iter().find(|f| f.name == change.field) {
                if let Some(value) = normalized(field, record) {
                    change.current_value = value;
                }
            }
            change.record_key = id;
            change.record_name = record.display_name.clone();
            Some(change)
        })
        .collect()
}

/// Group staged changes by the rules watching their field
pub fn group_by_rule(
    snapshot: &WatchSnapshot,
    staged: &[StagedChange],
) -> BTreeMap<i64, Vec<StagedChange>> {
    let mut grouped: BTreeMap<i64, Vec<StagedChange>> = BTreeMap::new();
    for change in staged {
        for rule_id in snapshot.rules_for(&change.model, &change.field) {
            grouped.entry(*rule_id).or_default().push(change.clone());
        }
    }
    grouped
}

/// Record-store wrapper staging notifications for watched fields
pub struct FieldWatchInterceptor<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> FieldWatchInterceptor<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Watch index for a model, `None` when the model is not intercepted
    async fn watch_for(&self, model: &ModelDescriptor) -> Option<Arc<WatchSnapshot>> {
        if is_excluded(&model.name) {
            return None;
        }
        match self.ctx.field_cache().snapshot(self.ctx.rule_repo()).await {
            Ok(snapshot) if snapshot.is_model_watched(&model.name) => Some(snapshot),
            Ok(_) => None,
            Err(e) => {
                warn!(model = %model.name, error = %e, "Notification field cache unavailable, skipping interception");
                None
            }
        }
    }

    /// Create records, staging one entry per watched field set on each row
    #[instrument(skip(self, model, rows), fields(model = %model.name, rows = rows.len()))]
    pub async fn create(
        &self,
        model: &ModelDescriptor,
        rows: &[Values],
        user_id: Option<i64>,
    ) -> ServiceResult<Intercepted<Vec<i64>>> {
        let store = self.ctx.record_store();
        let Some(snapshot) = self.watch_for(model).await else {
            return Ok(Intercepted::passthrough(store.create(model, rows, user_id).await?));
        };

        let mut staged = Vec::new();
        let mut fields: Vec<&FieldDescriptor> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            for (name, raw) in row {
                if is_unset(raw) || !snapshot.is_watched(&model.name, name) {
                    continue;
                }
                let Some(field) = model.field(name) else {
                    continue;
                };
                if !fields.iter().any(|f| f.name == field.name) {
                    fields.push(field);
                }
                staged.push(StagedChange {
                    model: model.name.clone(),
                    field: field.name.clone(),
                    field_label: field.label.clone(),
                    record_key: -(i as i64 + 1),
                    record_name: String::new(),
                    old_value: None,
                    current_value: raw
                        .as_str()
                        .map_or_else(|| raw.to_string(), str::to_string),
                });
            }
        }

        let ids = store.create(model, rows, user_id).await?;
        if staged.is_empty() {
            return Ok(Intercepted::passthrough(ids));
        }

        let records: HashMap<i64, Record> = store
            .read(model, &ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let staged = resolve_created(staged, &ids, &records, &fields);

        let notifications = self.enqueue(&snapshot, &staged, user_id).await;
        Ok(Intercepted {
            value: ids,
            notifications,
        })
    }

    /// Write records, staging watched fields whose value actually changed
    #[instrument(skip(self, model, values), fields(model = %model.name, count = ids.len()))]
    pub async fn write(
        &self,
        model: &ModelDescriptor,
        ids: &[i64],
        values: &Values,
        user_id: Option<i64>,
    ) -> ServiceResult<Intercepted<()>> {
        let store = self.ctx.record_store();
        let snapshot = self.watch_for(model).await;

        let watched: Vec<&FieldDescriptor> = match &snapshot {
            Some(snapshot) => values
                .keys()
                .filter(|name| snapshot.is_watched(&model.name, name))
                .filter_map(|name| model.field(name))
                .collect(),
            None => Vec::new(),
        };
        let Some(snapshot) = snapshot.filter(|_| !watched.is_empty()) else {
            store.write(model, ids, values, user_id).await?;
            return Ok(Intercepted::passthrough(()));
        };

        let before: HashMap<i64, Record> = store
            .read(model, ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        store.write(model, ids, values, user_id).await?;

        let after = store.read(model, ids).await?;
        let mut staged = Vec::new();
        for record in &after {
            let Some(previous) = before.get(&record.id) else {
                continue;
            };
            for field in &watched {
                let old = normalized(field, previous).unwrap_or_default();
                let new = normalized(field, record).unwrap_or_default();
                if old == new {
                    continue;
                }
                staged.push(StagedChange {
                    model: model.name.clone(),
                    field: field.name.clone(),
                    field_label: field.label.clone(),
                    record_key: record.id,
                    record_name: record.display_name.clone(),
                    old_value: Some(old),
                    current_value: new,
                });
            }
        }

        let notifications = self.enqueue(&snapshot, &staged, user_id).await;
        Ok(Intercepted {
            value: (),
            notifications,
        })
    }

    /// Delete records; never intercepted
    #[instrument(skip(self, model), fields(model = %model.name))]
    pub async fn delete(
        &self,
        model: &ModelDescriptor,
        ids: &[i64],
        user_id: Option<i64>,
    ) -> ServiceResult<()> {
        self.ctx.record_store().delete(model, ids, user_id).await?;
        Ok(())
    }

    /// Enqueue one mail task per rule, returning the number enqueued
    async fn enqueue(
        &self,
        snapshot: &WatchSnapshot,
        staged: &[StagedChange],
        user_id: Option<i64>,
    ) -> usize {
        let grouped = group_by_rule(snapshot, staged);
        if grouped.is_empty() {
            return 0;
        }

        let user_name = match user_id {
            Some(id) => match self.ctx.user_directory().find_by_id(id).await {
                Ok(Some(user)) => user.display_name().to_string(),
                Ok(None) => String::new(),
                Err(e) => {
                    warn!(user_id = id, error = %e, "Failed to resolve acting user");
                    String::new()
                }
            },
            None => String::new(),
        };

        let settings = self.ctx.settings();
        let now = Utc::now();
        let eta = now + settings.notification_delay;
        let mut enqueued = 0;

        for (rule_id, changes) in grouped {
            let task = NotificationTask {
                rule_id,
                user_id,
                user_name: user_name.clone(),
                timestamp: now,
                changes,
            };
            let payload = match serde_json::to_value(&task) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(rule_id, error = %e, "Failed to encode notification task");
                    continue;
                }
            };
            match self
                .ctx
                .task_queue()
                .enqueue(QueuedTask::new(settings.queue_name.clone(), payload, eta))
                .await
            {
                Ok(()) => enqueued += 1,
                Err(e) => warn!(rule_id, error = %e, "Failed to enqueue notification task"),
            }
        }

        debug!(enqueued, "Notification tasks enqueued");
        enqueued
    }
}
