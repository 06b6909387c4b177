//! Download service types and events.

use std::path::PathBuf;

use crate::utils::LadderTiers;

/// Files at or below this size are treated as missing or broken.
pub const DEFAULT_MIN_ASSET_SIZE: u64 = 5000;

/// Events emitted during download operations.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Work started on a record
    Started {
        worker_id: usize,
        id: String,
        filename: String,
    },
    /// Asset written to disk
    Completed {
        worker_id: usize,
        id: String,
        path: PathBuf,
        bytes: u64,
    },
    /// A complete file already existed
    AlreadyPresent { worker_id: usize, id: String },
    /// The record's URL cannot be fetched
    InvalidUrl { worker_id: usize, id: String },
    /// Every candidate URL failed
    Failed {
        worker_id: usize,
        id: String,
        error: String,
    },
}

/// What happened to a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    AlreadyPresent,
    InvalidUrl,
    Failed { error: String },
}

/// Result of a download operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadResult {
    pub downloaded: usize,
    /// Already present on disk.
    pub skipped: usize,
    pub invalid: usize,
    pub failed: usize,
}

impl DownloadResult {
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.invalid + self.failed
    }
}

/// Configuration for download service.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Bodies must be strictly larger than this many bytes.
    pub min_asset_size: u64,
    pub tiers: LadderTiers,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            min_asset_size: DEFAULT_MIN_ASSET_SIZE,
            tiers: LadderTiers::default(),
        }
    }
}
