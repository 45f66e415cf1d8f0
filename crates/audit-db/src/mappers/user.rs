//! User row -> entity

use audit_core::entities::User;

use crate::models::UserRow;

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            login: row.login,
            email: row.email,
        }
    }
}
