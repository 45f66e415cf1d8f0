//! Outbound notification mail via SMTP
//!
//! The rule's bound mail server wins; otherwise the default SMTP settings
//! are used. With neither, delivery is skipped.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use audit_common::SmtpConfig;
use audit_core::entities::{MailServer, MailTls};

use super::error::MailError;
use super::notification::NotificationMail;

/// Connection settings of one SMTP relay
#[derive(Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: MailTls,
}

impl std::fmt::Debug for TransportSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from", &self.from)
            .field("username", &self.username)
            .field("tls", &self.tls)
            .finish_non_exhaustive()
    }
}

impl From<&MailServer> for TransportSettings {
    fn from(server: &MailServer) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            from: server.from_address.clone(),
            username: server.username.clone(),
            password: server.password.clone(),
            tls: server.tls,
        }
    }
}

impl From<&SmtpConfig> for TransportSettings {
    fn from(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            from: config.from.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            tls: MailTls::from_str_lossy(&config.tls),
        }
    }
}

/// Sends an assembled message through a relay
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, settings: &TransportSettings, message: Message) -> Result<(), MailError>;
}

/// `lettre` async SMTP transport, one connection per message
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpMailSender;

#[async_trait]
impl MailSender for SmtpMailSender {
    async fn send(&self, settings: &TransportSettings, message: Message) -> Result<(), MailError> {
        let mut builder = match settings.tls {
            MailTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?,
            MailTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?,
            MailTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host),
        }
        .port(settings.port);

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        builder.build().send(message).await?;
        Ok(())
    }
}

/// Resolves the relay of a rule and sends its notification mail
#[derive(Clone)]
pub struct MailDispatcher {
    default_smtp: Option<SmtpConfig>,
    sender: Arc<dyn MailSender>,
}

impl MailDispatcher {
    /// Dispatcher sending through SMTP
    pub fn new(default_smtp: Option<SmtpConfig>) -> Self {
        Self::with_sender(default_smtp, Arc::new(SmtpMailSender))
    }

    pub fn with_sender(default_smtp: Option<SmtpConfig>, sender: Arc<dyn MailSender>) -> Self {
        Self {
            default_smtp,
            sender,
        }
    }

    /// Bound server first, default SMTP settings second
    pub fn resolve(&self, bound: Option<&MailServer>) -> Option<TransportSettings> {
        bound
            .map(TransportSettings::from)
            .or_else(|| self.default_smtp.as_ref().map(TransportSettings::from))
    }

    /// Assemble a multipart/alternative message
    pub fn build_message(
        settings: &TransportSettings,
        to: &str,
        mail: &NotificationMail,
    ) -> Result<Message, MailError> {
        let from: Mailbox = settings.from.parse()?;
        let to: Mailbox = to.parse()?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                mail.text.clone(),
                mail.html.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))
    }

    /// Send a rendered mail for a rule
    ///
    /// Returns `Ok(false)` when no relay is available.
    pub async fn dispatch(
        &self,
        rule_id: i64,
        bound: Option<&MailServer>,
        to: &str,
        mail: &NotificationMail,
    ) -> Result<bool, MailError> {
        let Some(settings) = self.resolve(bound) else {
            tracing::warn!(rule_id, "No mail server bound and no default SMTP settings, skipping notification");
            return Ok(false);
        };

        let message = Self::build_message(&settings, to, mail)?;
        self.sender.send(&settings, message).await?;

        tracing::info!(rule_id, to, host = %settings.host, "Notification email sent");
        Ok(true)
    }
}

impl std::fmt::Debug for MailDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailDispatcher")
            .field("default_smtp", &self.default_smtp)
            .finish_non_exhaustive()
    }
}
