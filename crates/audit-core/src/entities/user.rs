//! User entity - acting user of audited operations

use serde::{Deserialize, Serialize};

/// Application user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub login: String,
    pub email: Option<String>,
}

impl User {
    /// Name shown in reports and mail signatures
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.login
        } else {
            &self.name
        }
    }
}
