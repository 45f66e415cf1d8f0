//! Model registry database models

use sqlx::FromRow;

/// Database model for the ir_model table
#[derive(Debug, Clone, FromRow)]
pub struct IrModelRow {
    pub id: i64,
    pub model: String,
    pub name: String,
    pub table_name: Option<String>,
    pub history: bool,
    pub computed: bool,
    pub rec_name: String,
    /// `to_regclass(table_name) IS NOT NULL`
    pub table_present: bool,
    /// `to_regclass(table_name || '__history') IS NOT NULL`
    pub history_present: bool,
}

/// Database model for the ir_model_field table
#[derive(Debug, Clone, FromRow)]
pub struct IrModelFieldRow {
    pub model_id: i64,
    pub name: String,
    pub label: String,
    pub ttype: String,
    pub relation: Option<String>,
    pub relation_field: Option<String>,
    pub relation_table: Option<String>,
    pub relation_origin: Option<String>,
    pub relation_target: Option<String>,
    pub selection: Option<serde_json::Value>,
}
