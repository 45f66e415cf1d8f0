//! Typed bind values for dynamically-built statements

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs};
use sqlx::Postgres;

/// Typed bind value
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    BigInt(Option<i64>),
    BigIntArray(Vec<i64>),
    Double(Option<f64>),
    /// Decimal text, bound with a `::numeric` cast
    Numeric(Option<String>),
    Bool(Option<bool>),
    Text(Option<String>),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
}

impl BindValue {
    /// Placeholder text for parameter `idx`
    pub fn placeholder(&self, idx: usize) -> String {
        match self {
            Self::Numeric(_) => format!("${idx}::numeric"),
            _ => format!("${idx}"),
        }
    }
}

/// Bind a slice of `BindValue` to a sqlx `Query`
pub fn bind_query<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    values: &[BindValue],
) -> Query<'q, Postgres, PgArguments> {
    for val in values {
        q = match val.clone() {
            BindValue::BigInt(v) => q.bind(v),
            BindValue::BigIntArray(v) => q.bind(v),
            BindValue::Double(v) => q.bind(v),
            BindValue::Numeric(v) | BindValue::Text(v) => q.bind(v),
            BindValue::Bool(v) => q.bind(v),
            BindValue::Date(v) => q.bind(v),
            BindValue::Timestamp(v) => q.bind(v),
        };
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`
pub fn bind_query_as<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    values: &[BindValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for val in values {
        q = match val.clone() {
            BindValue::BigInt(v) => q.bind(v),
            BindValue::BigIntArray(v) => q.bind(v),
            BindValue::Double(v) => q.bind(v),
            BindValue::Numeric(v) | BindValue::Text(v) => q.bind(v),
            BindValue::Bool(v) => q.bind(v),
            BindValue::Date(v) => q.bind(v),
            BindValue::Timestamp(v) => q.bind(v),
        };
    }
    q
}
