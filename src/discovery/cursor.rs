//! Pagination cursor ("bookmark") handling.

use serde_json::Value;

/// Marker the API returns in place of a cursor on the last page.
pub const END_MARKER: &str = "-end-";

/// Read the next-page cursor from an API response.
///
/// Looks at `resource_response.bookmark` first, then the first entry of
/// `resource.options.bookmarks`.
pub fn next_cursor(response: &Value) -> Option<String> {
    let bookmark = response
        .get("resource_response")
        .and_then(|rr| rr.get("bookmark"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());

    let bookmark = bookmark.or_else(|| {
        response
            .pointer("/resource/options/bookmarks")
            .and_then(|b| match b {
                Value::Array(items) => items.first().and_then(Value::as_str),
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
    });

    bookmark.map(|s| s.to_string())
}

/// Whether a cursor means there are no more pages.
pub fn is_terminal(cursor: Option<&str>) -> bool {
    match cursor {
        None => true,
        Some(c) => c.is_empty() || c == END_MARKER,
    }
}
