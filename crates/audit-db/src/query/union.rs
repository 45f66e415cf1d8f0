//! Virtual audit log query
//!
//! Every stored model contributes subqueries tagging its rows with a literal
//! event type and model name:
//!
//! | storage      | create                              | write                                   | delete              |
//! |--------------|-------------------------------------|-----------------------------------------|---------------------|
//! | historized   | `write_date IS NULL AND create_date IS NOT NULL` | `write_date IS NOT NULL AND create_date IS NOT NULL` | `create_date IS NULL` |
//! | live table   | `write_date IS NULL` (never written) | `write_date IS NOT NULL` (last write)   | -                   |
//!
//! A live-table record shows up once: as its creation until the first write,
//! then as its last write.
//!
//! The subqueries are combined with `UNION ALL` and ordered newest first.
//! Filter placeholders are shared by all subqueries.

use audit_core::entities::{AuditLogQuery, EventType, ModelDescriptor};

use super::bind::BindValue;
use super::ident::{quote_ident, quote_literal};

const SELECT_COLUMNS: &str = "event_type, model, record_id, revision, user_id, date, history";

/// A built union statement and its bind values
#[derive(Debug, Clone, PartialEq)]
pub struct UnionQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
    /// Number of per-model subqueries
    pub subqueries: usize,
}

/// Placeholders of the active filters
#[derive(Debug, Default)]
struct Filters {
    users: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

impl Filters {
    fn new(query: &AuditLogQuery, binds: &mut Vec<BindValue>) -> Self {
        let mut filters = Self::default();

        if !query.users.is_empty() {
            binds.push(BindValue::BigIntArray(query.users.clone()));
            filters.users = Some(format!("${}", binds.len()));
        }
        if let Some(from) = query.from {
            binds.push(BindValue::Timestamp(Some(from)));
            filters.from = Some(format!("${}", binds.len()));
        }
        if let Some(to) = query.to {
            binds.push(BindValue::Timestamp(Some(to)));
            filters.to = Some(format!("${}", binds.len()));
        }

        filters
    }

    fn predicates(&self, user_col: &str, date_col: &str) -> Vec<String> {
        let mut predicates = Vec::new();
        if let Some(p) = &self.users {
            predicates.push(format!("t.{user_col} = ANY({p})"));
        }
        if let Some(p) = &self.from {
            predicates.push(format!("t.{date_col} >= {p}"));
        }
        if let Some(p) = &self.to {
            predicates.push(format!("t.{date_col} <= {p}"));
        }
        predicates
    }
}

/// Storage predicate selecting the rows of an event type, or `None` when the
/// storage kind never produces it
fn event_predicate(history: bool, event_type: EventType) -> Option<&'static str> {
    match (history, event_type) {
        (true, EventType::Create) => Some("t.write_date IS NULL AND t.create_date IS NOT NULL"),
        (true, EventType::Write) => Some("t.write_date IS NOT NULL AND t.create_date IS NOT NULL"),
        (true, EventType::Delete) => Some("t.create_date IS NULL"),
        (false, EventType::Create) => Some("t.write_date IS NULL"),
        (false, EventType::Write) => Some("t.write_date IS NOT NULL"),
        (false, EventType::Delete) => None,
    }
}

fn subquery(model: &ModelDescriptor, event_type: EventType, filters: &Filters) -> Option<String> {
    let storage = event_predicate(model.history, event_type)?;

    let (user_col, date_col) = match event_type {
        EventType::Create => ("create_uid", "create_date"),
        EventType::Write | EventType::Delete => ("write_uid", "write_date"),
    };
    let (table, revision) = if model.history {
        (quote_ident(&model.history_table()), "t.__id")
    } else {
        (quote_ident(&model.table), "t.id")
    };

    let mut predicates = vec![storage.to_string()];
    predicates.extend(filters.predicates(user_col, date_col));

    let mut sql = format!(
        "SELECT {event}::text AS event_type, {model}::text AS model, t.id AS record_id, \
         {revision} AS revision, t.{user_col} AS user_id, t.{date_col} AS date, \
         {history} AS history FROM {table} t",
        event = quote_literal(event_type.as_str()),
        model = quote_literal(&model.name),
        history = if model.history { "TRUE" } else { "FALSE" },
    );
    sql.push_str(" WHERE ");
    sql.push_str(&predicates.join(" AND "));
    Some(sql)
}

/// Build the audit log union for the given models
///
/// Returns `None` when no subquery remains (empty catalog, or filters that
/// exclude every model or event type).
pub fn build_union_query(models: &[ModelDescriptor], query: &AuditLogQuery) -> Option<UnionQuery> {
    let mut binds = Vec::new();
    let filters = Filters::new(query, &mut binds);

    let subqueries: Vec<String> = models
        .iter()
        .filter(|m| !m.computed && !m.table.is_empty())
        .filter(|m| query.wants_model(&m.name))
        .flat_map(|m| {
            EventType::ALL
                .into_iter()
                .filter(|t| query.wants(*t))
                .filter_map(|t| subquery(m, t, &filters))
                .collect::<Vec<_>>()
        })
        .collect();

    if subqueries.is_empty() {
        return None;
    }

    let mut sql = format!(
        "SELECT {SELECT_COLUMNS} FROM (\n{}\n) AS audit_log \
         ORDER BY date DESC, model, record_id, revision DESC",
        subqueries.join("\nUNION ALL\n")
    );
    if let Some(limit) = query.limit.filter(|l| *l > 0) {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    Some(UnionQuery {
        sql,
        binds,
        subqueries: subqueries.len(),
    })
}
