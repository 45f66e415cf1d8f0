//! Mail delivery errors

/// Error type for notification mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.)
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled
    #[error("Email build error: {0}")]
    Build(String),

    /// Neither a bound mail server nor default SMTP settings exist
    #[error("No mail server available for notification rule {0}")]
    NoServer(i64),
}
