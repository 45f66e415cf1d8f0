//! PostgreSQL implementation of RecordStore
//!
//! Historized models keep a `<table>__history` shadow table with a `__id`
//! serial and the same columns as the live table (all nullable). Every
//! create, write and delete appends a history row in the same transaction:
//! - create: copy of the new row (`write_date` NULL)
//! - write: copy of the updated row (`write_date` set)
//! - delete: closing row with `create_date` NULL and `write_date`/`write_uid` set
//!
//! `read_at` answers with the latest history row not newer than the requested
//! time, which is what the change diff relies on.

mod codec;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use audit_core::entities::{FieldKind, FieldValue, ModelDescriptor, Record, RecordRef, Values};
use audit_core::error::DomainError;
use audit_core::traits::{ModelCatalog, RecordStore, RepoResult};

use crate::query::{bind_query, bind_query_as, quote_ident, BindValue};

use super::catalog::PgModelCatalog;
use super::error::{map_db_error, record_not_found};

pub use codec::{parse_datetime, parse_reference};

const METADATA_COLUMNS: [&str; 4] = ["create_date", "create_uid", "write_date", "write_uid"];

/// Validity timestamp of a history row
const HISTORY_DATE: &str = "COALESCE(t.write_date, t.create_date)";

/// A stored row decoded from `row_to_json`
type JsonRow = Map<String, Value>;

/// Column values of one create/write, split by storage
#[derive(Debug, Default)]
struct Assignments {
    columns: Vec<(String, BindValue)>,
    links: Vec<(LinkTable, Vec<i64>)>,
}

/// Many2many link table coordinates
#[derive(Debug, Clone)]
struct LinkTable {
    table: String,
    origin: String,
    target: String,
}

/// PostgreSQL implementation of RecordStore
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    catalog: PgModelCatalog,
}

impl PgRecordStore {
    /// Create a new PgRecordStore
    pub fn new(pool: PgPool, catalog: PgModelCatalog) -> Self {
        Self { pool, catalog }
    }

    fn ensure_stored(model: &ModelDescriptor) -> RepoResult<()> {
        if model.computed || model.table.is_empty() {
            return Err(DomainError::ComputedModel(model.name.clone()));
        }
        Ok(())
    }

    /// Check incoming values against the model and split them by storage
    fn assignments(model: &ModelDescriptor, values: &Values) -> RepoResult<Assignments> {
        let mut out = Assignments::default();

        for (name, raw) in values {
            let field = model.field(name).ok_or_else(|| DomainError::FieldNotFound {
                model: model.name.clone(),
                field: name.clone(),
            })?;
            if field.is_audit_metadata() {
                return Err(DomainError::ReadOnlyField(name.clone()));
            }

            match &field.kind {
                FieldKind::One2Many { .. } => return Err(DomainError::ReadOnlyField(name.clone())),
                FieldKind::Many2Many {
                    link_table,
                    origin,
                    link_target,
                    ..
                } => {
                    let ids = codec::encode_ids(field, raw)?;
                    out.links.push((
                        LinkTable {
                            table: link_table.clone(),
                            origin: origin.clone(),
                            target: link_target.clone(),
                        },
                        ids,
                    ));
                }
                _ => out.columns.push((name.clone(), codec::encode_value(field, raw)?)),
            }
        }

        Ok(out)
    }

    /// Column list shared by the live and history tables
    fn stored_columns(model: &ModelDescriptor) -> Vec<String> {
        std::iter::once("id".to_string())
            .chain(model.column_fields().map(|f| f.name.clone()))
            .chain(METADATA_COLUMNS.iter().map(|c| (*c).to_string()))
            .map(|c| quote_ident(&c))
            .collect()
    }

    /// Append copies of the current rows to the history table
    async fn copy_to_history(
        tx: &mut Transaction<'_, Postgres>,
        model: &ModelDescriptor,
        ids: &[i64],
    ) -> RepoResult<()> {
        if !model.history || ids.is_empty() {
            return Ok(());
        }
        let columns = Self::stored_columns(model).join(", ");
        let sql = format!(
            "INSERT INTO {hist} ({columns}) SELECT {columns} FROM {table} WHERE id = ANY($1)",
            hist = quote_ident(&model.history_table()),
            table = quote_ident(&model.table),
        );
        sqlx::query(&sql)
            .bind(ids)
            .execute(&mut **tx)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    /// Replace the link rows of each record
    async fn replace_links(
        tx: &mut Transaction<'_, Postgres>,
        ids: &[i64],
        links: &[(LinkTable, Vec<i64>)],
    ) -> RepoResult<()> {
        for (link, targets) in links {
            let sql = format!(
                "DELETE FROM {} WHERE {} = ANY($1)",
                quote_ident(&link.table),
                quote_ident(&link.origin)
            );
            sqlx::query(&sql)
                .bind(ids)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;

            if targets.is_empty() {
                continue;
            }
            let sql = format!(
                "INSERT INTO {table} ({origin}, {target}) \
                 SELECT o, t FROM UNNEST($1::bigint[]) AS o CROSS JOIN UNNEST($2::bigint[]) AS t",
                table = quote_ident(&link.table),
                origin = quote_ident(&link.origin),
                target = quote_ident(&link.target),
            );
            sqlx::query(&sql)
                .bind(ids)
                .bind(targets)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;
        }
        Ok(())
    }

    /// Fetch live rows as JSON objects
    async fn fetch_live(&self, model: &ModelDescriptor, ids: &[i64]) -> RepoResult<Vec<JsonRow>> {
        let sql = format!(
            "SELECT row_to_json(t)::jsonb FROM {} t WHERE t.id = ANY($1)",
            quote_ident(&model.table)
        );
        let rows: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().filter_map(into_object).collect())
    }

    /// Display names of records of `model`, optionally as they were at `at`
    async fn display_names(
        &self,
        model_name: &str,
        ids: &[i64],
        at: Option<DateTime<Utc>>,
    ) -> RepoResult<HashMap<i64, String>> {
        let mut names = HashMap::new();
        if ids.is_empty() {
            return Ok(names);
        }
        let Some(model) = self.catalog.find_model(model_name).await? else {
            return Ok(names);
        };
        if model.computed || model.table.is_empty() {
            return Ok(names);
        }
        let rec = quote_ident(&model.rec_name);

        if let (Some(at), true) = (at, model.history) {
            let sql = format!(
                "SELECT DISTINCT ON (t.id) t.id, CAST(t.{rec} AS TEXT) \
                 FROM {hist} t \
                 WHERE t.id = ANY($1) AND t.create_date IS NOT NULL AND {HISTORY_DATE} <= $2 \
                 ORDER BY t.id, {HISTORY_DATE} DESC, t.__id DESC",
                hist = quote_ident(&model.history_table()),
            );
            let rows: Vec<(i64, Option<String>)> = sqlx::query_as(&sql)
                .bind(ids)
                .bind(at)
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error)?;
            names.extend(rows.into_iter().filter_map(|(id, n)| Some((id, n?))));
        }

        let missing: Vec<i64> = ids.iter().copied().filter(|id| !names.contains_key(id)).collect();
        if !missing.is_empty() {
            let sql = format!(
                "SELECT t.id, CAST(t.{rec} AS TEXT) FROM {} t WHERE t.id = ANY($1)",
                quote_ident(&model.table)
            );
            let rows: Vec<(i64, Option<String>)> = sqlx::query_as(&sql)
                .bind(&missing)
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error)?;
            names.extend(rows.into_iter().filter_map(|(id, n)| Some((id, n?))));
        }

        names.retain(|_, n| !n.is_empty());
        Ok(names)
    }

    /// Current targets of a list field, keyed by owning record
    async fn list_targets(
        &self,
        kind: &FieldKind,
        owners: &[i64],
    ) -> RepoResult<Option<(String, HashMap<i64, Vec<i64>>)>> {
        let (target, sql) = match kind {
            FieldKind::One2Many { target, inverse } => {
                let Some(target_model) = self.catalog.find_model(target).await? else {
                    return Ok(None);
                };
                let inverse = quote_ident(inverse);
                (
                    target.clone(),
                    format!(
                        "SELECT t.{inverse}, t.id FROM {} t WHERE t.{inverse} = ANY($1) ORDER BY t.id",
                        quote_ident(&target_model.table)
                    ),
                )
            }
            FieldKind::Many2Many {
                target,
                link_table,
                origin,
                link_target,
            } => (
                target.clone(),
                format!(
                    "SELECT {o}, {t} FROM {table} WHERE {o} = ANY($1) ORDER BY {t}",
                    o = quote_ident(origin),
                    t = quote_ident(link_target),
                    table = quote_ident(link_table),
                ),
            ),
            _ => return Ok(None),
        };

        let pairs: Vec<(i64, i64)> = sqlx::query_as(&sql)
            .bind(owners)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        let mut by_owner: HashMap<i64, Vec<i64>> = HashMap::new();
        for (owner, id) in pairs {
            by_owner.entry(owner).or_default().push(id);
        }
        Ok(Some((target, by_owner)))
    }

    /// Turn stored rows into records, resolving relations to display names
    ///
    /// List fields are only resolved for live reads (`at` is `None`).
    async fn decode_rows(
        &self,
        model: &ModelDescriptor,
        rows: Vec<JsonRow>,
        at: Option<DateTime<Utc>>,
    ) -> RepoResult<Vec<Record>> {
        let owners: Vec<i64> = rows.iter().filter_map(|r| r.get("id")?.as_i64()).collect();

        // Relation ids to resolve, per target model
        let mut wanted: HashMap<String, Vec<i64>> = HashMap::new();
        for row in &rows {
            for field in model.column_fields() {
                let raw = row.get(&field.name).unwrap_or(&Value::Null);
                match &field.kind {
                    FieldKind::Many2One { target } => {
                        if let Some(id) = raw.as_i64() {
                            wanted.entry(target.clone()).or_default().push(id);
                        }
                    }
                    FieldKind::Reference => {
                        if let Some((target, id)) = raw.as_str().and_then(parse_reference) {
                            wanted.entry(target.to_string()).or_default().push(id);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut lists: HashMap<String, (String, HashMap<i64, Vec<i64>>)> = HashMap::new();
        if at.is_none() && !owners.is_empty() {
            for field in model.fields.iter().filter(|f| f.kind.is_list()) {
                if let Some((target, by_owner)) = self.list_targets(&field.kind, &owners).await? {
                    wanted
                        .entry(target.clone())
                        .or_default()
                        .extend(by_owner.values().flatten().copied());
                    lists.insert(field.name.clone(), (target, by_owner));
                }
            }
        }

        let mut names: HashMap<String, HashMap<i64, String>> = HashMap::new();
        for (target, mut ids) in wanted {
            ids.sort_unstable();
            ids.dedup();
            let resolved = self.display_names(&target, &ids, at).await?;
            names.insert(target, resolved);
        }
        let reference = |target: &str, id: i64| {
            let display = names
                .get(target)
                .and_then(|m| m.get(&id))
                .cloned()
                .unwrap_or_else(|| format!("{target},{id}"));
            RecordRef::new(target, id, display)
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(id) = row.get("id").and_then(Value::as_i64) else {
                continue;
            };
            let mut values = BTreeMap::new();

            for field in model.column_fields() {
                let raw = row.get(&field.name).unwrap_or(&Value::Null);
                let value = match &field.kind {
                    FieldKind::Many2One { target } => {
                        FieldValue::Relation(raw.as_i64().map(|rid| reference(target, rid)))
                    }
                    FieldKind::Reference => FieldValue::Relation(
                        raw.as_str()
                            .and_then(parse_reference)
                            .map(|(target, rid)| reference(target, rid)),
                    ),
                    kind => match codec::decode_scalar(kind, raw) {
                        Some(v) => v,
                        None => {
                            tracing::debug!(model = %model.name, field = %field.name, "Undecodable stored value");
                            continue;
                        }
                    },
                };
                values.insert(field.name.clone(), value);
            }

            for (name, (target, by_owner)) in &lists {
                let refs = by_owner
                    .get(&id)
                    .map(|ids| ids.iter().map(|rid| reference(target, *rid)).collect())
                    .unwrap_or_default();
                values.insert(name.clone(), FieldValue::Relations(refs));
            }

            let display_name = codec::display_text(row.get(&model.rec_name))
                .unwrap_or_else(|| model.fallback_display_name(id));

            records.push(Record {
                model: model.name.clone(),
                id,
                display_name,
                values,
            });
        }

        Ok(records)
    }
}

fn into_object(value: Value) -> Option<JsonRow> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Current time at the storage precision (microseconds)
fn storage_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[instrument(skip(self, model), fields(model = %model.name))]
    async fn read(&self, model: &ModelDescriptor, ids: &[i64]) -> RepoResult<Vec<Record>> {
        Self::ensure_stored(model)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.fetch_live(model, ids).await?;
        let mut records = self.decode_rows(model, rows, None).await?;
        records.sort_by_key(|r| ids.iter().position(|id| *id == r.id));
        Ok(records)
    }

    #[instrument(skip(self, model), fields(model = %model.name))]
    async fn read_at(
        &self,
        model: &ModelDescriptor,
        id: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Record>> {
        Self::ensure_stored(model)?;
        if !model.history {
            return Ok(None);
        }

        let sql = format!(
            "SELECT row_to_json(t)::jsonb FROM {hist} t \
             WHERE t.id = $1 AND {HISTORY_DATE} <= $2 \
             ORDER BY {HISTORY_DATE} DESC, t.__id DESC LIMIT 1",
            hist = quote_ident(&model.history_table()),
        );
        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        let Some(row) = row.and_then(into_object) else {
            return Ok(None);
        };
        // Closing row: the record was deleted at that time
        if row.get("create_date").map_or(true, Value::is_null) {
            return Ok(None);
        }

        Ok(self.decode_rows(model, vec![row], Some(at)).await?.pop())
    }

    #[instrument(skip(self, model, rows), fields(model = %model.name, rows = rows.len()))]
    async fn create(
        &self,
        model: &ModelDescriptor,
        rows: &[Values],
        user_id: Option<i64>,
    ) -> RepoResult<Vec<i64>> {
        Self::ensure_stored(model)?;
        let now = storage_now();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let mut ids = Vec::with_capacity(rows.len());

        for values in rows {
            let assignments = Self::assignments(model, values)?;

            let mut columns: Vec<String> = Vec::new();
            let mut placeholders: Vec<String> = Vec::new();
            let mut binds: Vec<BindValue> = Vec::new();
            for (name, value) in assignments.columns {
                columns.push(quote_ident(&name));
                placeholders.push(value.placeholder(binds.len() + 1));
                binds.push(value);
            }
            for (name, value) in [
                ("create_date", BindValue::Timestamp(Some(now))),
                ("create_uid", BindValue::BigInt(user_id)),
            ] {
                columns.push(quote_ident(name));
                placeholders.push(value.placeholder(binds.len() + 1));
                binds.push(value);
            }

            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
                quote_ident(&model.table),
                columns.join(", "),
                placeholders.join(", ")
            );
            let (id,): (i64,) = bind_query_as(sqlx::query_as(&sql), &binds)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_db_error)?;

            Self::replace_links(&mut tx, &[id], &assignments.links).await?;
            Self::copy_to_history(&mut tx, model, &[id]).await?;
            ids.push(id);
        }

        tx.commit().await.map_err(map_db_error)?;
        tracing::debug!(model = %model.name, ?ids, "Records created");
        Ok(ids)
    }

    #[instrument(skip(self, model, values), fields(model = %model.name))]
    async fn write(
        &self,
        model: &ModelDescriptor,
        ids: &[i64],
        values: &Values,
        user_id: Option<i64>,
    ) -> RepoResult<()> {
        Self::ensure_stored(model)?;
        if ids.is_empty() {
            return Ok(());
        }
        let assignments = Self::assignments(model, values)?;
        let now = storage_now();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let mut sets: Vec<String> = Vec::new();
        let mut binds: Vec<BindValue> = Vec::new();
        for (name, value) in assignments.columns {
            sets.push(format!("{} = {}", quote_ident(&name), value.placeholder(binds.len() + 1)));
            binds.push(value);
        }
        for (name, value) in [
            ("write_date", BindValue::Timestamp(Some(now))),
            ("write_uid", BindValue::BigInt(user_id)),
        ] {
            sets.push(format!("{} = {}", quote_ident(name), value.placeholder(binds.len() + 1)));
            binds.push(value);
        }
        binds.push(BindValue::BigIntArray(ids.to_vec()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ANY(${}) RETURNING id",
            quote_ident(&model.table),
            sets.join(", "),
            binds.len()
        );
        let updated: Vec<(i64,)> = bind_query_as(sqlx::query_as(&sql), &binds)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if let Some(missing) = ids.iter().find(|id| !updated.iter().any(|(u,)| u == *id)) {
            return Err(record_not_found(&model.name, *missing));
        }

        Self::replace_links(&mut tx, ids, &assignments.links).await?;
        Self::copy_to_history(&mut tx, model, ids).await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self, model), fields(model = %model.name))]
    async fn delete(
        &self,
        model: &ModelDescriptor,
        ids: &[i64],
        user_id: Option<i64>,
    ) -> RepoResult<()> {
        Self::ensure_stored(model)?;
        if ids.is_empty() {
            return Ok(());
        }
        let now = storage_now();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        if model.history {
            let sql = format!(
                "INSERT INTO {hist} (id, write_date, write_uid) \
                 SELECT id, $2, $3 FROM {table} WHERE id = ANY($1)",
                hist = quote_ident(&model.history_table()),
                table = quote_ident(&model.table),
            );
            bind_query(
                sqlx::query(&sql),
                &[
                    BindValue::BigIntArray(ids.to_vec()),
                    BindValue::Timestamp(Some(now)),
                    BindValue::BigInt(user_id),
                ],
            )
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        for field in &model.fields {
            if let FieldKind::Many2Many {
                link_table, origin, ..
            } = &field.kind
            {
                let sql = format!(
                    "DELETE FROM {} WHERE {} = ANY($1)",
                    quote_ident(link_table),
                    quote_ident(origin)
                );
                sqlx::query(&sql)
                    .bind(ids)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_db_error)?;
            }
        }

        let sql = format!(
            "DELETE FROM {} WHERE id = ANY($1) RETURNING id",
            quote_ident(&model.table)
        );
        let deleted: Vec<(i64,)> = sqlx::query_as(&sql)
            .bind(ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if let Some(missing) = ids.iter().find(|id| !deleted.iter().any(|(d,)| d == *id)) {
            return Err(record_not_found(&model.name, *missing));
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }
}
