//! User database model

use sqlx::FromRow;

/// Database model for the res_user table
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub login: String,
    pub email: Option<String>,
}
