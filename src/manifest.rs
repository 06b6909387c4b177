//! `pins.json` manifest of discovered records.
//!
//! The manifest is a pretty-printed JSON array in discovery order. It is
//! written after discovery and can be read back to resume downloads
//! without discovering again.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{is_valid_id, ContentRecord, RecordSet};

/// File name of the manifest inside an output directory.
pub const MANIFEST_FILENAME: &str = "pins.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Manifest location for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}

/// Write `records` to `path`, replacing any existing manifest.
pub async fn write_manifest(path: &Path, records: &[ContentRecord]) -> Result<(), ManifestError> {
    let json = serde_json::to_string_pretty(records).map_err(|source| ManifestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a manifest back into records, in file order.
///
/// Entries whose id is not digits-only are skipped, and only the first
/// entry for each id is kept.
pub async fn read_manifest(path: &Path) -> Result<Vec<ContentRecord>, ManifestError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let entries: Vec<ContentRecord> =
        serde_json::from_str(&contents).map_err(|source| ManifestError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let mut records = RecordSet::new();
    for entry in entries {
        if !is_valid_id(&entry.id) {
            warn!("Skipping manifest entry with invalid id {:?}", entry.id);
            continue;
        }
        if !records.insert(entry) {
            debug!("Skipping duplicate manifest entry");
        }
    }
    Ok(records.into_records())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn records() -> Vec<ContentRecord> {
        vec![
            ContentRecord::new(
                "555".to_string(),
                "https://x/736x/a/b.jpg".to_string(),
                "Cat".to_string(),
            ),
            ContentRecord::new(
                "12".to_string(),
                "https://i.pinimg.com/originals/c.png".to_string(),
                "گربه".to_string(),
            ),
        ]
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = manifest_path(dir.path());

        write_manifest(&path, &records()).await.unwrap();
        let read = read_manifest(&path).await.unwrap();

        assert_eq!(read, records());
    }

    #[tokio::test]
    async fn test_layout_uses_wire_names_and_keeps_unicode() {
        let dir = tempdir().unwrap();
        let path = manifest_path(dir.path());

        write_manifest(&path, &records()).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("[\n  {"));
        assert!(text.contains(r#""pin_id": "555""#));
        assert!(text.contains(r#""url": "https://x/736x/a/b.jpg""#));
        assert!(text.contains(r#""pin_url": "https://www.pinterest.com/pin/555/""#));
        assert!(text.contains("گربه"));
    }

    #[tokio::test]
    async fn test_missing_pin_url_defaults_to_empty() {
        let dir = tempdir().unwrap();
        let path = manifest_path(dir.path());
        std::fs::write(
            &path,
            r#"[{"pin_id": "1", "url": "https://x/a.jpg", "title": "A"}]"#,
        )
        .unwrap();

        let read = read_manifest(&path).await.unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].page_url, "");
    }

    #[tokio::test]
    async fn test_invalid_ids_are_skipped() {
        let dir = tempdir().unwrap();
        let path = manifest_path(dir.path());
        std::fs::write(
            &path,
            r#"[
                {"pin_id": "../../evil", "url": "https://x/a.jpg", "title": "t"},
                {"pin_id": "", "url": "https://x/b.jpg", "title": "t"},
                {"pin_id": "12a", "url": "https://x/c.jpg", "title": "t"},
                {"pin_id": "7", "url": "https://x/d.jpg", "title": "t"}
            ]"#,
        )
        .unwrap();

        let read = read_manifest(&path).await.unwrap();
        let ids: Vec<&str> = read.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["7"]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_first_entry() {
        let dir = tempdir().unwrap();
        let path = manifest_path(dir.path());
        std::fs::write(
            &path,
            r#"[
                {"pin_id": "5", "url": "https://x/first.jpg", "title": "A"},
                {"pin_id": "6", "url": "https://x/other.jpg", "title": "B"},
                {"pin_id": "5", "url": "https://x/second.jpg", "title": "C"}
            ]"#,
        )
        .unwrap();

        let read = read_manifest(&path).await.unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].id, "5");
        assert_eq!(read[0].source_url, "https://x/first.jpg");
        assert_eq!(read[1].id, "6");
    }

    #[tokio::test]
    async fn test_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            read_manifest(&missing).await,
            Err(ManifestError::Io { .. })
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();
        assert!(matches!(
            read_manifest(&broken).await,
            Err(ManifestError::Json { .. })
        ));
    }
}
