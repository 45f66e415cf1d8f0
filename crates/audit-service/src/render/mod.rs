//! Human-readable rendering of field values and timestamps

mod format;

pub use format::{display_value, escape_html, format_timestamp, DATETIME_FORMAT};
