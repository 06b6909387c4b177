//! Record discovery in rendered profile pages.
//!
//! Profile HTML embeds the initial application state as JSON. Several
//! strategies are tried from most to least structured:
//!
//! 1. the `__PWS_DATA__` state blob (script element or assignment) or the
//!    legacy `P.start.start(...)` bootstrap call
//! 2. inline JSON objects that look like pins
//! 3. a direct id/image-URL pattern scan when nothing else matched

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use super::extract::RecordExtractor;
use crate::models::{ContentRecord, RecordSet};

static PWS_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)__PWS_DATA__\s*=\s*(\{.+?\})(?:</script>|;)").unwrap());

static P_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)P\.start\.start\((\{.+?\})\)").unwrap());

static INLINE_PIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{"id"\s*:\s*"\d{10,}"[^}]{20,}"images"[^}]{10,}\}"#).unwrap()
});

static PIN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""id"\s*:\s*"(\d{10,})""#).unwrap());

static PINIMG_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""url"\s*:\s*"(https://i\.pinimg\.com/[^"]+)""#).unwrap());

/// How far past an id the direct scan looks for its image URL.
const DIRECT_SCAN_WINDOW: usize = 800;

/// Scan rendered HTML for records.
///
/// Returns the number of records added to `records`.
pub fn scan_html(html: &str, extractor: &RecordExtractor, records: &mut RecordSet) -> usize {
    if html.is_empty() {
        return 0;
    }
    let before = records.len();

    for blob in state_blobs(html) {
        let gained = extractor.extract_from_text(&blob, records);
        debug!("Embedded state blob: {} records", gained);
        if records.len() > before {
            return records.len() - before;
        }
    }

    for fragment in INLINE_PIN.find_iter(html) {
        // The pattern stops at the first closing brace, which leaves the
        // nested image objects unterminated.
        extractor.extract_from_text(&close_braces(fragment.as_str()), records);
    }

    if records.len() == before {
        debug!("Trying direct pattern scan for image URLs");
        scan_direct(html, records);
    }

    debug!("HTML extraction: {} records", records.len() - before);
    records.len() - before
}

/// Candidate JSON state blobs in priority order.
fn state_blobs(html: &str) -> Vec<String> {
    let mut blobs = Vec::new();

    let document = Html::parse_document(html);
    if let Ok(selector) = Selector::parse("script#__PWS_DATA__") {
        for script in document.select(&selector) {
            let text: String = script.text().collect();
            if !text.trim().is_empty() {
                blobs.push(text);
            }
        }
    }

    for pattern in [&*PWS_ASSIGNMENT, &*P_START] {
        if let Some(caps) = pattern.captures(html) {
            blobs.push(caps[1].to_string());
        }
    }

    blobs
}

/// Append the closing braces a truncated JSON object is missing.
fn close_braces(fragment: &str) -> String {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for c in fragment.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    let mut closed = String::with_capacity(fragment.len() + depth);
    closed.push_str(fragment);
    closed.extend(std::iter::repeat('}').take(depth));
    closed
}

/// Pair each long numeric id with the first image URL that follows it
/// inside the same JSON object.
fn scan_direct(html: &str, records: &mut RecordSet) {
    for caps in PIN_ID.captures_iter(html) {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let id = id.as_str();
        if records.contains(id) {
            continue;
        }

        let rest = &html[whole.end()..];
        let window_end = rest
            .char_indices()
            .nth(DIRECT_SCAN_WINDOW)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..window_end];
        let window = match window.find('}') {
            Some(pos) => &window[..pos],
            None => window,
        };

        if let Some(url) = PINIMG_URL.captures(window).and_then(|c| c.get(1)) {
            records.insert(ContentRecord::new(
                id.to_string(),
                url.as_str().to_string(),
                ContentRecord::fallback_title(id),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(html: &str) -> RecordSet {
        let mut records = RecordSet::new();
        scan_html(html, &RecordExtractor::default(), &mut records);
        records
    }

    #[test]
    fn test_pws_script_element() {
        let html = r#"<html><head>
            <script id="__PWS_DATA__" type="application/json">
            {"props":{"initialReduxState":{"pins":{
                "1111111111":{"id":"1111111111","title":"Sunset","images":{"736x":{"url":"https://i.pinimg.com/736x/aa/sun.jpg"}}},
                "2222222222":{"id":"2222222222","images":{"474x":{"url":"https://i.pinimg.com/474x/bb/moon.png"}}}
            }}}}
            </script></head><body></body></html>"#;
        let records = scan(html);
        assert_eq!(records.len(), 2);
        assert_eq!(records.get("1111111111").unwrap().title, "Sunset");
        assert_eq!(records.get("2222222222").unwrap().title, "pin_2222222222");
    }

    #[test]
    fn test_pws_assignment() {
        let html = r#"<script>window.__PWS_DATA__ = {"a":[{"id":"3333333333","images":{"736x":{"url":"https://i.pinimg.com/736x/c.jpg"}}}]};</script>"#;
        let records = scan(html);
        assert!(records.contains("3333333333"));
    }

    #[test]
    fn test_inline_fragment() {
        let html = r#"<div data-x='{"id":"4444444444","title":"Inline pin here","images":{"736x":{"url":"https://i.pinimg.com/736x/d.jpg"}}}'></div>"#;
        let records = scan(html);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records.get("4444444444").unwrap().source_url,
            "https://i.pinimg.com/736x/d.jpg"
        );
    }

    #[test]
    fn test_direct_scan_fallback() {
        let html = r#"garbage "id": "5555555555", "foo": 1, "url": "https://i.pinimg.com/236x/e.jpg" more"#;
        let records = scan(html);
        let record = records.get("5555555555").unwrap();
        assert_eq!(record.source_url, "https://i.pinimg.com/236x/e.jpg");
        assert_eq!(record.title, "pin_5555555555");
    }

    #[test]
    fn test_direct_scan_stops_at_object_end() {
        let html = r#""id": "6666666666", "x": 1}, {"url": "https://i.pinimg.com/236x/f.jpg""#;
        assert!(scan(html).is_empty());
    }

    #[test]
    fn test_malformed_blob_is_not_fatal() {
        let html = r#"<script id="__PWS_DATA__">{"broken": </script>"#;
        assert!(scan(html).is_empty());
    }

    #[test]
    fn test_close_braces() {
        assert_eq!(close_braces(r#"{"a":{"b":"}"}"#), r#"{"a":{"b":"}"}}"#);
        assert_eq!(close_braces("{}"), "{}");
    }

    #[test]
    fn test_empty_html() {
        assert!(scan("").is_empty());
    }
}
