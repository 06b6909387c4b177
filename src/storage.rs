//! Storage helpers for downloaded assets on disk.

use std::path::{Path, PathBuf};

use crate::models::ContentRecord;
use crate::utils::{extension_for_url, sanitize_filename};

/// Suffix of in-progress writes.
pub const PART_SUFFIX: &str = ".part";

/// Construct the storage path for a record's asset.
///
/// `{output_dir}/{sanitized_title}_{id}{extension}`, with the extension
/// taken from the source URL.
pub fn asset_path(output_dir: &Path, record: &ContentRecord) -> PathBuf {
    let filename = format!(
        "{}_{}{}",
        sanitize_filename(&record.title),
        record.id,
        extension_for_url(&record.source_url)
    );
    output_dir.join(filename)
}

/// Temporary path used while `path` is being written.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

/// Whether a complete asset larger than `min_size` bytes already exists.
pub async fn is_present(path: &Path, min_size: u64) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > min_size,
        Err(_) => false,
    }
}

/// Write `content` to `path` via a `.part` sibling and a rename, so `path`
/// only ever holds complete content.
pub async fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let tmp = part_path(path);
    if let Err(e) = tokio::fs::write(&tmp, content).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    tokio::fs::rename(&tmp, path).await
}
