//! Content records and the deduplicating collection they are gathered in.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Base URL for canonical pin pages.
pub const PIN_PAGE_BASE: &str = "https://www.pinterest.com/pin";

/// One discovered content item.
///
/// Field names on the wire follow the manifest format (`pin_id`, `url`,
/// `title`, `pin_url`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Digits-only identifier, unique within a run.
    #[serde(rename = "pin_id")]
    pub id: String,
    /// Best image or video URL known at discovery time.
    #[serde(rename = "url")]
    pub source_url: String,
    /// Sanitized display name, never empty.
    pub title: String,
    /// Canonical page reference (may be empty).
    #[serde(rename = "pin_url", default)]
    pub page_url: String,
}

impl ContentRecord {
    /// Create a record with the canonical page URL derived from the id.
    pub fn new(id: String, source_url: String, title: String) -> Self {
        let page_url = page_url_for(&id);
        Self {
            id,
            source_url,
            title,
            page_url,
        }
    }

    /// Title used when a payload carries no usable name.
    pub fn fallback_title(id: &str) -> String {
        format!("pin_{}", id)
    }
}

/// Canonical page URL for a pin id.
pub fn page_url_for(id: &str) -> String {
    format!("{}/{}/", PIN_PAGE_BASE, id)
}

/// Check that an id is non-empty and all ASCII digits.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Insertion-ordered set of records keyed by id.
///
/// The first record inserted for an id wins; later inserts for the same id
/// are dropped without touching the stored record.
#[derive(Debug, Default, Clone)]
pub struct RecordSet {
    seen: HashSet<String>,
    records: Vec<ContentRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Returns false if its id was already present.
    pub fn insert(&mut self, record: ContentRecord) -> bool {
        if self.seen.contains(&record.id) {
            return false;
        }
        self.seen.insert(record.id.clone());
        self.records.push(record);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ContentRecord> {
        if !self.contains(id) {
            return None;
        }
        self.records.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentRecord> {
        self.records.iter()
    }

    /// Consume the set, returning records in first-discovery order.
    pub fn into_records(self) -> Vec<ContentRecord> {
        self.records
    }
}

impl Extend<ContentRecord> for RecordSet {
    fn extend<T: IntoIterator<Item = ContentRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<ContentRecord> for RecordSet {
    fn from_iter<T: IntoIterator<Item = ContentRecord>>(iter: T) -> Self {
        let mut set = RecordSet::new();
        set.extend(iter);
        set
    }
}
