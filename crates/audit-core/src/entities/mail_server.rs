//! Mail server entity - outbound SMTP settings a notification rule binds to

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Transport security of an SMTP connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTls {
    None,
    #[default]
    StartTls,
    Tls,
}

impl MailTls {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StartTls => "starttls",
            Self::Tls => "tls",
        }
    }

    /// Parse the stored tag, defaulting to STARTTLS
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "tls" | "ssl" => Self::Tls,
            _ => Self::StartTls,
        }
    }
}

/// Outbound mail server
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailServer {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub tls: MailTls,
}

// Credentials stay out of logs
impl std::fmt::Debug for MailServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailServer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from_address", &self.from_address)
            .field("username", &self.username)
            .field("tls", &self.tls)
            .finish_non_exhaustive()
    }
}

/// Input for registering a mail server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewMailServer {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(email)]
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub tls: MailTls,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_parse() {
        assert_eq!(MailTls::from_str_lossy("SSL"), MailTls::Tls);
        assert_eq!(MailTls::from_str_lossy("none"), MailTls::None);
        assert_eq!(MailTls::from_str_lossy("whatever"), MailTls::StartTls);
        assert_eq!(MailTls::Tls.as_str(), "tls");
    }

    #[test]
    fn test_password_not_serialized() {
        let server = MailServer {
            id: 1,
            name: "Relay".to_string(),
            host: "smtp.example.com".to_string(),
            port: 587,
            from_address: "noreply@example.com".to_string(),
            username: Some("relay".to_string()),
            password: Some("secret".to_string()),
            tls: MailTls::StartTls,
        };
        let json = serde_json::to_string(&server).unwrap();
        assert!(!json.contains("secret"));
        assert!(!format!("{server:?}").contains("secret"));
    }
}
