//! Mail server database model

use sqlx::FromRow;

/// Database model for the mail_server table
#[derive(Debug, Clone, FromRow)]
pub struct MailServerRow {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: String,
}
