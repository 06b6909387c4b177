//! Structural record extraction from arbitrary JSON payloads.
//!
//! Payloads come from several endpoints with no shared schema, so records
//! are located by shape rather than by path: any mapping with a numeric
//! `id` and a non-empty `images` mapping is a record. The walk is
//! pre-order over `serde_json::Value` with keys visited in payload order;
//! the first qualifying node for an id wins.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{ContentRecord, RecordSet};
use crate::utils::sanitize_filename;

/// Default image keys, checked in order.
pub const DEFAULT_RESOLUTION_LADDER: &[&str] = &["736x", "474x", "236x", "orig"];

/// Fields consulted for a human-readable title, in order.
const TITLE_FIELDS: &[&str] = &["title", "grid_title", "description"];

/// Why a mapping was not accepted as a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("mapping has no id")]
    MissingId,
    #[error("id is not numeric: {0}")]
    InvalidId(String),
    #[error("mapping has no images")]
    MissingImages,
    #[error("no image url in resolution ladder")]
    NoImageUrl,
}

/// Walks payload trees and collects records into a [`RecordSet`].
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    resolution_ladder: Vec<String>,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION_LADDER.iter().map(|s| s.to_string()).collect())
    }
}

impl RecordExtractor {
    /// Create an extractor with a custom resolution ladder.
    ///
    /// An empty ladder falls back to the default one.
    pub fn new(resolution_ladder: Vec<String>) -> Self {
        let resolution_ladder = if resolution_ladder.is_empty() {
            DEFAULT_RESOLUTION_LADDER.iter().map(|s| s.to_string()).collect()
        } else {
            resolution_ladder
        };
        Self { resolution_ladder }
    }

    pub fn resolution_ladder(&self) -> &[String] {
        &self.resolution_ladder
    }

    /// Collect every record reachable from `node` into `records`.
    pub fn extract(&self, node: &Value, records: &mut RecordSet) {
        match node {
            Value::Array(items) => {
                for item in items {
                    self.extract(item, records);
                }
            }
            Value::Object(map) => {
                if let Ok(record) = self.try_record(map) {
                    if !records.contains(&record.id) {
                        records.insert(record);
                        return;
                    }
                }

                for value in map.values() {
                    if value.is_object() || value.is_array() {
                        self.extract(value, records);
                    }
                }
            }
            _ => {}
        }
    }

    /// Parse `text` as JSON and extract from it.
    ///
    /// Unparsable text yields no records. Returns the number of new records.
    pub fn extract_from_text(&self, text: &str, records: &mut RecordSet) -> usize {
        let before = records.len();
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.extract(&value, records),
            Err(e) => tracing::debug!("Skipping unparsable payload fragment: {}", e),
        }
        records.len() - before
    }

    /// Interpret a single mapping as a record.
    pub fn try_record(&self, map: &Map<String, Value>) -> Result<ContentRecord, ExtractError> {
        let id = match map.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) if n.is_u64() => n.to_string(),
            Some(Value::Null) | None => return Err(ExtractError::MissingId),
            Some(other) => return Err(ExtractError::InvalidId(other.to_string())),
        };
        if id.is_empty() {
            return Err(ExtractError::MissingId);
        }
        if !crate::models::is_valid_id(&id) {
            return Err(ExtractError::InvalidId(id));
        }

        let images = match map.get("images") {
            Some(Value::Object(images)) if !images.is_empty() => images,
            _ => return Err(ExtractError::MissingImages),
        };

        let url = self
            .resolution_ladder
            .iter()
            .filter_map(|key| images.get(key))
            .filter_map(|rendition| rendition.get("url").and_then(Value::as_str))
            .find(|url| !url.is_empty())
            .ok_or(ExtractError::NoImageUrl)?;

        let title = TITLE_FIELDS
            .iter()
            .filter_map(|field| map.get(*field).and_then(Value::as_str))
            .find(|t| !t.trim().is_empty())
            .map(sanitize_filename)
            .unwrap_or_else(|| ContentRecord::fallback_title(&id));

        Ok(ContentRecord::new(id, url.to_string(), title))
    }
}

/// Extract with the default resolution ladder.
pub fn extract(node: &Value, records: &mut RecordSet) {
    RecordExtractor::default().extract(node, records);
}
