//! Drive `q` filter construction.
//!
//! Values are always escaped before they are placed inside a quoted string
//! literal, so names containing `'` or `\` produce a valid query.

use crate::contract::FOLDER_MIME_TYPE;

/// Escape a value for use inside a single-quoted Drive query literal.
pub fn escape_query_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Query matching non-trashed folders named exactly `name` directly under `parent_id`.
pub fn folder_lookup_query(name: &str, parent_id: &str) -> String {
    format!(
        "mimeType = '{}' and name = '{}' and '{}' in parents and trashed = false",
        FOLDER_MIME_TYPE,
        escape_query_value(name),
        escape_query_value(parent_id),
    )
}
