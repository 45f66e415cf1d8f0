//! Notification mail rendering and SMTP dispatch

mod dispatcher;
mod error;
mod notification;

pub use dispatcher::{MailDispatcher, MailSender, SmtpMailSender, TransportSettings};
pub use error::MailError;
pub use notification::NotificationMail;
