//! In-memory ports for service tests

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use audit_core::entities::{
    AuditEvent, AuditLogQuery, EventType, FieldDescriptor, FieldKind, FieldValue, MailServer,
    ModelDescriptor, NewMailServer, NewNotificationRule, NotificationRule, QueuedTask, Record,
    RecordRef, SelectionOption, User, Values,
};
use audit_core::error::DomainError;
use audit_core::traits::{
    AuditLogRepository, MailServerRepository, ModelCatalog, NotificationRuleRepository,
    RecordStore, RepoResult, SessionStore, TaskQueue, UserDirectory,
};
use audit_core::value_objects::WatchedField;

use crate::mail::MailDispatcher;
use crate::services::{ServiceContext, ServiceContextBuilder, ServiceSettings};

pub fn task_model() -> ModelDescriptor {
    ModelDescriptor {
        name: "project.task".to_string(),
        label: "Task".to_string(),
        table: "project_task".to_string(),
        history: true,
        computed: false,
        rec_name: "name".to_string(),
        fields: vec![
            FieldDescriptor::new("id", "ID", FieldKind::Integer),
            FieldDescriptor::new("name", "Name", FieldKind::Char),
            FieldDescriptor::new("priority", "Priority", FieldKind::Char),
            FieldDescriptor::new(
                "state",
                "State",
                FieldKind::Selection {
                    options: vec![
                        SelectionOption::new("open", "Open"),
                        SelectionOption::new("done", "Done"),
                    ],
                },
            ),
            FieldDescriptor::new(
                "party",
                "Customer",
                FieldKind::Many2One {
                    target: "party.party".to_string(),
                },
            ),
            FieldDescriptor::new("write_date", "Edited at", FieldKind::DateTime),
        ],
    }
}

pub fn party_model() -> ModelDescriptor {
    ModelDescriptor {
        name: "party.party".to_string(),
        label: "Party".to_string(),
        table: "party_party".to_string(),
        history: false,
        computed: false,
        rec_name: "name".to_string(),
        fields: vec![FieldDescriptor::new("name", "Name", FieldKind::Char)],
    }
}

/// Bookkeeping model in an excluded namespace
pub fn config_model() -> ModelDescriptor {
    ModelDescriptor {
        name: "ir.configuration".to_string(),
        label: "Configuration".to_string(),
        table: "ir_configuration".to_string(),
        history: true,
        computed: false,
        rec_name: "name".to_string(),
        fields: vec![
            FieldDescriptor::new("name", "Name", FieldKind::Char),
            FieldDescriptor::new("priority", "Priority", FieldKind::Char),
        ],
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub struct MemoryCatalog {
    models: Vec<ModelDescriptor>,
}

#[async_trait]
impl ModelCatalog for MemoryCatalog {
    async fn list_models(&self) -> RepoResult<Vec<ModelDescriptor>> {
        Ok(self.models.clone())
    }

    async fn find_model(&self, name: &str) -> RepoResult<Option<ModelDescriptor>> {
        Ok(self.models.iter().find(|m| m.name == name).cloned())
    }
}

// ============================================================================
// Records with history
// ============================================================================

/// One historized state; `None` closes the record
#[derive(Clone)]
struct Revision {
    id: i64,
    model: String,
    record_id: i64,
    event_type: EventType,
    user_id: Option<i64>,
    at: DateTime<Utc>,
    state: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Default)]
struct RecordsInner {
    next_id: i64,
    live: HashMap<String, BTreeMap<i64, BTreeMap<String, serde_json::Value>>>,
    revisions: Vec<Revision>,
    clock: i64,
}

impl RecordsInner {
    /// Strictly increasing timestamps, one millisecond apart
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(self.clock)
    }

    fn record_revision(
        &mut self,
        model: &str,
        record_id: i64,
        event_type: EventType,
        user_id: Option<i64>,
        state: Option<BTreeMap<String, serde_json::Value>>,
    ) {
        let at = self.tick();
        let id = self.revisions.len() as i64 + 1;
        self.revisions.push(Revision {
            id,
            model: model.to_string(),
            record_id,
            event_type,
            user_id,
            at,
            state,
        });
    }
}

/// Record store and audit log over the same in-memory tables
pub struct MemoryRecords {
    models: Vec<ModelDescriptor>,
    inner: Mutex<RecordsInner>,
}

impl MemoryRecords {
    fn model(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.name == name)
    }

    fn display_name(
        &self,
        inner: &RecordsInner,
        model: &str,
        id: i64,
    ) -> String {
        let Some(descriptor) = self.model(model) else {
            return format!("{model},{id}");
        };
        inner
            .live
            .get(model)
            .and_then(|rows| rows.get(&id))
            .and_then(|row| row.get(&descriptor.rec_name))
            .and_then(|v| v.as_str())
            .map_or_else(|| descriptor.fallback_display_name(id), str::to_string)
    }

    fn decode(
        &self,
        inner: &RecordsInner,
        model: &ModelDescriptor,
        id: i64,
        row: &BTreeMap<String, serde_json::Value>,
    ) -> Record {
        let mut values = BTreeMap::new();
        for field in model.column_fields() {
            let raw = row.get(&field.name).cloned().unwrap_or(serde_json::Value::Null);
            let value = match (&field.kind, raw) {
                (FieldKind::Many2One { target }, serde_json::Value::Number(n)) => {
                    let target_id = n.as_i64().unwrap_or_default();
                    FieldValue::Relation(Some(RecordRef::new(
                        target.clone(),
                        target_id,
                        self.display_name(inner, target, target_id),
                    )))
                }
                (FieldKind::Many2One { .. }, _) => FieldValue::Relation(None),
                (_, serde_json::Value::Null) => FieldValue::Null,
                (_, serde_json::Value::String(s)) => FieldValue::Text(s),
                (_, serde_json::Value::Bool(b)) => FieldValue::Boolean(b),
                (_, serde_json::Value::Number(n)) => FieldValue::Integer(n.as_i64().unwrap_or_default()),
                (_, other) => FieldValue::Text(other.to_string()),
            };
            values.insert(field.name.clone(), value);
        }
        let display_name = row
            .get(&model.rec_name)
            .and_then(|v| v.as_str())
            .map_or_else(|| model.fallback_display_name(id), str::to_string);

        Record {
            model: model.name.clone(),
            id,
            display_name,
            values,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecords {
    async fn read(&self, model: &ModelDescriptor, ids: &[i64]) -> RepoResult<Vec<Record>> {
        let inner = self.inner.lock();
        let Some(rows) = inner.live.get(&model.name) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id).map(|row| self.decode(&inner, model, *id, row)))
            .collect())
    }

    async fn read_at(
        &self,
        model: &ModelDescriptor,
        id: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Record>> {
        if !model.history {
            return Ok(None);
        }
        let inner = self.inner.lock();
        let state = inner
            .revisions
            .iter()
            .rev()
            .find(|r| r.model == model.name && r.record_id == id && r.at <= at)
            .and_then(|r| r.state.clone());
        Ok(state.map(|row| self.decode(&inner, model, id, &row)))
    }

    async fn create(
        &self,
        model: &ModelDescriptor,
        rows: &[Values],
        user_id: Option<i64>,
    ) -> RepoResult<Vec<i64>> {
        let mut inner = self.inner.lock();
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            inner.next_id += 1;
            let id = inner.next_id;
            let state: BTreeMap<String, serde_json::Value> =
                row.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            inner
                .live
                .entry(model.name.clone())
                .or_default()
                .insert(id, state.clone());
            inner.record_revision(&model.name, id, EventType::Create, user_id, Some(state));
            ids.push(id);
        }
        Ok(ids)
    }

    async fn write(
        &self,
        model: &ModelDescriptor,
        ids: &[i64],
        values: &Values,
        user_id: Option<i64>,
    ) -> RepoResult<()> {
        let mut inner = self.inner.lock();
        for id in ids {
            let state = {
                let row = inner
                    .live
                    .get_mut(&model.name)
                    .and_then(|rows| rows.get_mut(id))
                    .ok_or_else(|| DomainError::RecordNotFound {
                        model: model.name.clone(),
                        id: *id,
                    })?;
                for (k, v) in values {
                    row.insert(k.clone(), v.clone());
                }
                row.clone()
            };
            inner.record_revision(&model.name, *id, EventType::Write, user_id, Some(state));
        }
        Ok(())
    }

    async fn delete(
        &self,
        model: &ModelDescriptor,
        ids: &[i64],
        user_id: Option<i64>,
    ) -> RepoResult<()> {
        let mut inner = self.inner.lock();
        for id in ids {
            inner
                .live
                .get_mut(&model.name)
                .and_then(|rows| rows.remove(id))
                .ok_or_else(|| DomainError::RecordNotFound {
                    model: model.name.clone(),
                    id: *id,
                })?;
            inner.record_revision(&model.name, *id, EventType::Delete, user_id, None);
        }
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for MemoryRecords {
    async fn query_events(
        &self,
        models: &[ModelDescriptor],
        query: &AuditLogQuery,
    ) -> RepoResult<Vec<AuditEvent>> {
        let inner = self.inner.lock();
        let mut events: Vec<AuditEvent> = inner
            .revisions
            .iter()
            .filter(|r| models.iter().any(|m| m.name == r.model && !m.computed))
            .filter(|r| query.wants_model(&r.model) && query.wants(r.event_type))
            .filter(|r| query.users.is_empty() || r.user_id.is_some_and(|u| query.users.contains(&u)))
            .filter(|r| query.from.map_or(true, |from| r.at >= from))
            .filter(|r| query.to.map_or(true, |to| r.at <= to))
            .map(|r| AuditEvent {
                event_type: r.event_type,
                user_id: r.user_id,
                date: r.at,
                model: r.model.clone(),
                record_id: r.record_id,
                revision: r.id,
                history: true,
                changes: String::new(),
            })
            .collect();
        events.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(limit) = query.limit {
            events.truncate(limit as usize);
        }
        Ok(events)
    }
}

// ============================================================================
// Rules and mail servers
// ============================================================================

#[derive(Default)]
pub struct MemoryRules {
    rules: Mutex<Vec<NotificationRule>>,
    pub target_loads: Mutex<usize>,
}

#[async_trait]
impl NotificationRuleRepository for MemoryRules {
    async fn list(&self) -> RepoResult<Vec<NotificationRule>> {
        Ok(self.rules.lock().clone())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<NotificationRule>> {
        Ok(self.rules.lock().iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, rule: &NewNotificationRule) -> RepoResult<NotificationRule> {
        let mut rules = self.rules.lock();
        let now = Utc::now();
        let created = NotificationRule {
            id: rules.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            name: rule.name.clone(),
            email: rule.email.clone(),
            mail_server_id: rule.mail_server_id,
            targets: rule.targets.clone(),
            created_at: now,
            updated_at: now,
        };
        rules.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, rule: &NewNotificationRule) -> RepoResult<NotificationRule> {
        let mut rules = self.rules.lock();
        let existing = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(DomainError::RuleNotFound(id))?;
        existing.name = rule.name.clone();
        existing.email = rule.email.clone();
        existing.mail_server_id = rule.mail_server_id;
        existing.targets = rule.targets.clone();
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut rules = self.rules.lock();
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Err(DomainError::RuleNotFound(id));
        }
        Ok(())
    }

    async fn list_targets(&self) -> RepoResult<Vec<(WatchedField, i64)>> {
        *self.target_loads.lock() += 1;
        Ok(self
            .rules
            .lock()
            .iter()
            .flat_map(|r| r.targets.iter().map(move |t| (t.clone(), r.id)))
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryMailServers {
    servers: Mutex<Vec<MailServer>>,
}

#[async_trait]
impl MailServerRepository for MemoryMailServers {
    async fn list(&self) -> RepoResult<Vec<MailServer>> {
        Ok(self.servers.lock().clone())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<MailServer>> {
        Ok(self.servers.lock().iter().find(|s| s.id == id).cloned())
    }

    async fn create(&self, server: &NewMailServer) -> RepoResult<MailServer> {
        let mut servers = self.servers.lock();
        let created = MailServer {
            id: servers.len() as i64 + 1,
            name: server.name.clone(),
            host: server.host.clone(),
            port: server.port,
            from_address: server.from_address.clone(),
            username: server.username.clone(),
            password: server.password.clone(),
            tls: server.tls,
        };
        servers.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut servers = self.servers.lock();
        let before = servers.len();
        servers.retain(|s| s.id != id);
        if servers.len() == before {
            return Err(DomainError::MailServerNotFound(id));
        }
        Ok(())
    }
}

// ============================================================================
// Users, queue and sessions
// ============================================================================

pub struct MemoryUsers {
    users: Vec<User>,
}

#[async_trait]
impl UserDirectory for MemoryUsers {
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<User>> {
        Ok(self
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryQueue {
    pub tasks: Mutex<Vec<QueuedTask>>,
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    async fn enqueue(&self, task: QueuedTask) -> RepoResult<()> {
        self.tasks.lock().push(task);
        Ok(())
    }

    async fn dequeue_due(
        &self,
        queue: &str,
        now: DateTime<Utc>,
        max: usize,
    ) -> RepoResult<Vec<QueuedTask>> {
        let mut tasks = self.tasks.lock();
        let mut due = Vec::new();
        let mut i = 0;
        while i < tasks.len() && due.len() < max {
            if tasks[i].queue == queue && tasks[i].is_due(now) {
                due.push(tasks.remove(i));
            } else {
                i += 1;
            }
        }
        Ok(due)
    }
}

#[derive(Default)]
pub struct MemorySessions {
    pub sessions: Mutex<HashMap<String, serde_json::Value>>,
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn put(&self, id: &str, state: serde_json::Value) -> RepoResult<()> {
        self.sessions.lock().insert(id.to_string(), state);
        Ok(())
    }

    async fn get(&self, id: &str) -> RepoResult<Option<serde_json::Value>> {
        Ok(self.sessions.lock().get(id).cloned())
    }

    async fn remove(&self, id: &str) -> RepoResult<()> {
        self.sessions.lock().remove(id);
        Ok(())
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// Service context over in-memory ports, with handles to inspect them
pub struct Fixture {
    pub ctx: ServiceContext,
    pub records: Arc<MemoryRecords>,
    pub rules: Arc<MemoryRules>,
    pub mail_servers: Arc<MemoryMailServers>,
    pub queue: Arc<MemoryQueue>,
    pub sessions: Arc<MemorySessions>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_settings(ServiceSettings::default())
    }

    pub fn with_settings(settings: ServiceSettings) -> Self {
        let dispatcher = MailDispatcher::new(settings.smtp.clone());
        Self::with_dispatcher(settings, dispatcher)
    }

    pub fn with_dispatcher(settings: ServiceSettings, dispatcher: MailDispatcher) -> Self {
        let models = vec![task_model(), party_model(), config_model()];
        let records = Arc::new(MemoryRecords {
            models: models.clone(),
            inner: Mutex::new(RecordsInner::default()),
        });
        let rules = Arc::new(MemoryRules::default());
        let mail_servers = Arc::new(MemoryMailServers::default());
        let queue = Arc::new(MemoryQueue::default());
        let sessions = Arc::new(MemorySessions::default());
        let users = Arc::new(MemoryUsers {
            users: vec![User {
                id: 1,
                name: "Alice".to_string(),
                login: "alice".to_string(),
                email: Some("alice@example.com".to_string()),
            }],
        });

        let ctx = ServiceContextBuilder::new()
            .catalog(Arc::new(MemoryCatalog { models }))
            .record_store(records.clone())
            .audit_log_repo(records.clone())
            .rule_repo(rules.clone())
            .mail_server_repo(mail_servers.clone())
            .user_directory(users)
            .task_queue(queue.clone())
            .session_store(sessions.clone())
            .mail_dispatcher(dispatcher)
            .settings(settings)
            .build()
            .unwrap();

        Self {
            ctx,
            records,
            rules,
            mail_servers,
            queue,
            sessions,
        }
    }

    pub fn values(pairs: &[(&str, serde_json::Value)]) -> Values {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    /// Add a rule directly to the repository, bypassing cache invalidation
    pub async fn add_rule(&self, name: &str, targets: &[(&str, &str)]) -> NotificationRule {
        self.rules
            .create(&NewNotificationRule {
                name: name.to_string(),
                email: "ops@example.com".to_string(),
                mail_server_id: None,
                targets: targets
                    .iter()
                    .map(|(m, f)| WatchedField::new(*m, *f))
                    .collect(),
            })
            .await
            .unwrap()
    }

    pub fn queued(&self) -> Vec<QueuedTask> {
        self.queue.tasks.lock().clone()
    }
}
