//! Helpers for reading HTML form fields
//!
//! Admin forms post every field as a string. Unchecked checkboxes and blank
//! inputs are indistinguishable from missing fields, so everything arrives as
//! `Option<String>` and is normalized here.

use chrono::{DateTime, Utc};
use orgsite_common::datetime::parse_timestamp;

/// Trimmed value, `None` when missing or blank
pub fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checkbox state. Browsers send `on`; API clients tend to send `true` or `1`.
pub fn checkbox(value: &Option<String>) -> bool {
    matches!(value.as_deref().map(str::trim), Some("on" | "true" | "1"))
}

/// Integer field, `default` when missing or blank
pub fn integer(value: &Option<String>, default: i32) -> Result<i32, std::num::ParseIntError> {
    match text(value) {
        Some(raw) => raw.parse(),
        None => Ok(default),
    }
}

/// Date or datetime field
pub fn timestamp(value: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(value).ok()
}
