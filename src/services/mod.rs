//! Service layer.
//!
//! Domain logic separated from UI concerns, usable from the CLI or any
//! other front end.

pub mod download;

pub use download::{
    AssetFetcher, DownloadConfig, DownloadEvent, DownloadOutcome, DownloadResult, DownloadService,
};
