//! Mail server row -> entity

use audit_core::entities::{MailServer, MailTls};

use crate::models::MailServerRow;

impl From<MailServerRow> for MailServer {
    fn from(row: MailServerRow) -> Self {
        MailServer {
            id: row.id,
            name: row.name,
            host: row.host,
            port: u16::try_from(row.port).unwrap_or(25),
            from_address: row.from_address,
            username: row.username,
            password: row.password,
            tls: MailTls::from_str_lossy(&row.tls),
        }
    }
}
