//! Value objects - immutable types that represent domain concepts

mod event_key;
mod watched_field;

pub use event_key::{EventKey, EventKeyParseError};
pub use watched_field::WatchedField;
