//! Axum extractors for request handling
//!
//! Custom extractors for authentication, validation and typed parameters.

mod auth;
mod params;
mod validated;

pub use auth::{AdminUser, AuthUser};
pub use params::{ApiPath, ApiQuery};
pub use validated::{OptionalValidatedJson, ValidatedJson};
