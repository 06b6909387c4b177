//! Asset download service.
//!
//! Fetches the assets of discovered records into a directory on a bounded
//! worker pool. Each record walks its URL ladder until one candidate yields
//! a usable body. Separated from UI concerns - emits events for progress
//! tracking.

mod types;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::models::ContentRecord;
use crate::scrapers::FetchError;
use crate::storage::{asset_path, is_present, write_atomic};
use crate::utils::candidates_with_tiers;

pub use types::{
    DownloadConfig, DownloadEvent, DownloadOutcome, DownloadResult, DEFAULT_MIN_ASSET_SIZE,
};

/// Default number of concurrent downloads.
pub const DEFAULT_CONCURRENCY: usize = 12;

/// Something that can retrieve the bytes behind an asset URL.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch a URL. Non-success statuses are errors.
    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Service for downloading record assets.
pub struct DownloadService<F> {
    fetcher: Arc<F>,
    config: DownloadConfig,
}

impl<F: AssetFetcher + 'static> DownloadService<F> {
    /// Create a new download service.
    pub fn new(fetcher: F, config: DownloadConfig) -> Self {
        Self::with_shared(Arc::new(fetcher), config)
    }

    pub fn with_shared(fetcher: Arc<F>, config: DownloadConfig) -> Self {
        Self { fetcher, config }
    }

    /// Download every record's asset into `output_dir`.
    pub async fn fetch(
        &self,
        records: Vec<ContentRecord>,
        output_dir: &Path,
        concurrency: usize,
    ) -> anyhow::Result<DownloadResult> {
        self.run(records, output_dir, concurrency, None).await
    }

    /// Like [`fetch`](Self::fetch), reporting progress on `event_tx`.
    pub async fn fetch_with_events(
        &self,
        records: Vec<ContentRecord>,
        output_dir: &Path,
        concurrency: usize,
        event_tx: mpsc::Sender<DownloadEvent>,
    ) -> anyhow::Result<DownloadResult> {
        self.run(records, output_dir, concurrency, Some(event_tx))
            .await
    }

    async fn run(
        &self,
        records: Vec<ContentRecord>,
        output_dir: &Path,
        concurrency: usize,
        event_tx: Option<mpsc::Sender<DownloadEvent>>,
    ) -> anyhow::Result<DownloadResult> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let workers = concurrency.max(1).min(records.len().max(1));
        info!(
            "Downloading {} assets to {} with {} workers",
            records.len(),
            output_dir.display(),
            workers
        );

        let downloaded = Arc::new(AtomicUsize::new(0));
        let skipped = Arc::new(AtomicUsize::new(0));
        let invalid = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let (queue_tx, queue_rx) = mpsc::channel::<ContentRecord>(records.len().max(1));
        for record in records {
            // Capacity covers every record and the receiver is alive.
            let _ = queue_tx.send(record).await;
        }
        drop(queue_tx);

        let queue = Arc::new(Mutex::new(queue_rx));
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let fetcher = self.fetcher.clone();
            let config = self.config.clone();
            let output_dir = output_dir.to_path_buf();
            let queue = queue.clone();
            let permits = permits.clone();
            let downloaded = downloaded.clone();
            let skipped = skipped.clone();
            let invalid = invalid.clone();
            let failed = failed.clone();
            let event_tx = event_tx.clone();

            let handle = tokio::spawn(async move {
                loop {
                    let Some(record) = queue.lock().await.recv().await else {
                        break;
                    };
                    let Ok(_permit) = permits.acquire().await else {
                        break;
                    };

                    let dest = asset_path(&output_dir, &record);
                    let filename = dest
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    emit(
                        &event_tx,
                        DownloadEvent::Started {
                            worker_id,
                            id: record.id.clone(),
                            filename,
                        },
                    )
                    .await;

                    let outcome = fetch_record(fetcher.as_ref(), &record, &dest, &config).await;
                    let id = record.id.clone();
                    let event = match outcome {
                        DownloadOutcome::Downloaded { path, bytes } => {
                            downloaded.fetch_add(1, Ordering::Relaxed);
                            DownloadEvent::Completed {
                                worker_id,
                                id,
                                path,
                                bytes,
                            }
                        }
                        DownloadOutcome::AlreadyPresent => {
                            skipped.fetch_add(1, Ordering::Relaxed);
                            DownloadEvent::AlreadyPresent { worker_id, id }
                        }
                        DownloadOutcome::InvalidUrl => {
                            invalid.fetch_add(1, Ordering::Relaxed);
                            DownloadEvent::InvalidUrl { worker_id, id }
                        }
                        DownloadOutcome::Failed { error } => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            DownloadEvent::Failed {
                                worker_id,
                                id,
                                error,
                            }
                        }
                    };
                    emit(&event_tx, event).await;
                }
            });

            handles.push(handle);
        }

        // Wait for all workers
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Download worker exited abnormally: {}", e);
            }
        }

        let result = DownloadResult {
            downloaded: downloaded.load(Ordering::Relaxed),
            skipped: skipped.load(Ordering::Relaxed),
            invalid: invalid.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
        };
        info!(
            "Downloads finished: {} new, {} present, {} invalid, {} failed",
            result.downloaded, result.skipped, result.invalid, result.failed
        );
        Ok(result)
    }
}

async fn emit(event_tx: &Option<mpsc::Sender<DownloadEvent>>, event: DownloadEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.send(event).await;
    }
}

/// Whether a URL is an absolute http(s) URL with a host.
pub fn is_fetchable_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Download one record, trying each ladder candidate in turn.
pub async fn fetch_record<F: AssetFetcher + ?Sized>(
    fetcher: &F,
    record: &ContentRecord,
    dest: &Path,
    config: &DownloadConfig,
) -> DownloadOutcome {
    if !is_fetchable_url(&record.source_url) {
        debug!("Pin {}: invalid url {:?}", record.id, record.source_url);
        return DownloadOutcome::InvalidUrl;
    }

    if is_present(dest, config.min_asset_size).await {
        debug!("Pin {}: already present at {}", record.id, dest.display());
        return DownloadOutcome::AlreadyPresent;
    }

    let mut last_error = String::from("no candidate urls");
    for candidate in candidates_with_tiers(&record.source_url, &config.tiers) {
        let body = match fetcher.fetch_asset(&candidate).await {
            Ok(body) => body,
            Err(e) => {
                debug!("Pin {}: {} failed: {}", record.id, candidate, e);
                last_error = e.to_string();
                continue;
            }
        };

        if (body.len() as u64) <= config.min_asset_size {
            debug!(
                "Pin {}: {} too small ({} bytes)",
                record.id,
                candidate,
                body.len()
            );
            last_error = format!("body too small ({} bytes)", body.len());
            continue;
        }

        return match write_atomic(dest, &body).await {
            Ok(()) => DownloadOutcome::Downloaded {
                path: dest.to_path_buf(),
                bytes: body.len() as u64,
            },
            Err(e) => DownloadOutcome::Failed {
                error: format!("write {}: {}", dest.display(), e),
            },
        };
    }

    DownloadOutcome::Failed { error: last_error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::tempdir;

    use crate::storage::part_path;

    #[derive(Default)]
    struct FakeFetcher {
        bodies: HashMap<String, Vec<u8>>,
        calls: std::sync::Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl FakeFetcher {
        fn with(bodies: &[(&str, usize)]) -> Self {
            Self {
                bodies: bodies
                    .iter()
                    .map(|(url, size)| (url.to_string(), vec![b'x'; *size]))
                    .collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AssetFetcher for FakeFetcher {
        async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.bodies.get(url).cloned().ok_or(FetchError::Status(404))
        }
    }

    fn record(id: &str, url: &str) -> ContentRecord {
        ContentRecord::new(id.to_string(), url.to_string(), format!("Pin {}", id))
    }

    #[tokio::test]
    async fn test_prefers_original_resolution() {
        let dir = tempdir().unwrap();
        let fetcher = FakeFetcher::with(&[
            ("https://i.pinimg.com/originals/a/b.jpg", 6000),
            ("https://i.pinimg.com/736x/a/b.jpg", 6000),
        ]);
        let service = DownloadService::new(fetcher, DownloadConfig::default());

        let result = service
            .fetch(
                vec![record("1", "https://i.pinimg.com/736x/a/b.jpg")],
                dir.path(),
                4,
            )
            .await
            .unwrap();

        assert_eq!(result.downloaded, 1);
        assert_eq!(
            service.fetcher.calls(),
            vec!["https://i.pinimg.com/originals/a/b.jpg"]
        );
        let written = std::fs::read(dir.path().join("Pin 1_1.jpg")).unwrap();
        assert_eq!(written.len(), 6000);
    }

    #[tokio::test]
    async fn test_falls_back_past_missing_and_small_candidates() {
        let dir = tempdir().unwrap();
        let fetcher = FakeFetcher::with(&[
            ("https://i.pinimg.com/474x/a/b.jpg", 100),
            ("https://i.pinimg.com/236x/a/b.jpg", 7000),
        ]);
        let dest = dir.path().join("Pin 1_1.jpg");

        let outcome = fetch_record(
            &fetcher,
            &record("1", "https://i.pinimg.com/236x/a/b.jpg?cache=1"),
            &dest,
            &DownloadConfig::default(),
        )
        .await;

        assert_eq!(
            outcome,
            DownloadOutcome::Downloaded {
                path: dest.clone(),
                bytes: 7000
            }
        );
        assert_eq!(fetcher.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_high_tier_input_beats_medium_when_original_missing() {
        let dir = tempdir().unwrap();
        let fetcher = FakeFetcher::with(&[
            ("https://i.pinimg.com/736x/a/b.jpg", 6000),
            ("https://i.pinimg.com/474x/a/b.jpg", 6000),
        ]);
        let dest = dir.path().join("Pin 1_1.jpg");

        let outcome = fetch_record(
            &fetcher,
            &record("1", "https://i.pinimg.com/736x/a/b.jpg"),
            &dest,
            &DownloadConfig::default(),
        )
        .await;

        assert!(matches!(outcome, DownloadOutcome::Downloaded { .. }));
        assert_eq!(
            fetcher.calls(),
            vec![
                "https://i.pinimg.com/originals/a/b.jpg",
                "https://i.pinimg.com/736x/a/b.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn test_all_candidates_missing_fails_without_file() {
        let dir = tempdir().unwrap();
        let service = DownloadService::new(FakeFetcher::default(), DownloadConfig::default());

        let result = service
            .fetch(
                vec![record("555", "https://x.test/736x/a/b.jpg")],
                dir.path(),
                2,
            )
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.downloaded, 0);
        let dest = dir.path().join("Pin 555_555.jpg");
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_invalid_urls_are_not_fetched() {
        let dir = tempdir().unwrap();
        let service = DownloadService::new(FakeFetcher::default(), DownloadConfig::default());

        let result = service
            .fetch(
                vec![
                    record("1", ""),
                    record("2", "ftp://x.test/a.jpg"),
                    record("3", "not a url"),
                    record("4", "https://"),
                ],
                dir.path(),
                2,
            )
            .await
            .unwrap();

        assert_eq!(result.invalid, 4);
        assert!(service.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_second_run_skips_everything() {
        let dir = tempdir().unwrap();
        let urls = [
            "https://i.pinimg.com/736x/a/1.jpg",
            "https://i.pinimg.com/736x/a/2.png",
            "https://i.pinimg.com/736x/a/3.gif",
        ];
        let fetcher =
            FakeFetcher::with(&urls.iter().map(|u| (*u, 6000)).collect::<Vec<_>>());
        let service = DownloadService::new(fetcher, DownloadConfig::default());
        let records: Vec<_> = urls
            .iter()
            .enumerate()
            .map(|(i, u)| record(&(i + 1).to_string(), u))
            .collect();

        let first = service.fetch(records.clone(), dir.path(), 3).await.unwrap();
        assert_eq!(first.downloaded, 3);
        let calls_after_first = service.fetcher.calls().len();
        let modified = std::fs::metadata(dir.path().join("Pin 1_1.jpg"))
            .unwrap()
            .modified()
            .unwrap();

        let second = service.fetch(records, dir.path(), 3).await.unwrap();
        assert_eq!(second.downloaded, 0);
        assert_eq!(second.skipped, 3);
        assert_eq!(service.fetcher.calls().len(), calls_after_first);
        assert_eq!(
            std::fs::metadata(dir.path().join("Pin 1_1.jpg"))
                .unwrap()
                .modified()
                .unwrap(),
            modified
        );
    }

    #[tokio::test]
    async fn test_undersized_existing_file_is_refetched() {
        let dir = tempdir().unwrap();
        let url = "https://x.test/img.webp";
        std::fs::write(dir.path().join("Pin 9_9.webp"), b"tiny").unwrap();
        let service =
            DownloadService::new(FakeFetcher::with(&[(url, 6000)]), DownloadConfig::default());

        let result = service
            .fetch(vec![record("9", url)], dir.path(), 1)
            .await
            .unwrap();

        assert_eq!(result.downloaded, 1);
        assert_eq!(
            std::fs::metadata(dir.path().join("Pin 9_9.webp")).unwrap().len(),
            6000
        );
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let dir = tempdir().unwrap();
        let records: Vec<_> = (0..12)
            .map(|i| record(&i.to_string(), &format!("https://x.test/{}.jpg", i)))
            .collect();
        let mut fetcher = FakeFetcher::with(
            &records
                .iter()
                .map(|r| (r.source_url.as_str(), 6000))
                .collect::<Vec<_>>(),
        );
        fetcher.delay = Duration::from_millis(20);
        let service = DownloadService::new(fetcher, DownloadConfig::default());

        let result = service.fetch(records, dir.path(), 3).await.unwrap();

        assert_eq!(result.downloaded, 12);
        assert!(service.fetcher.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_events_match_counters() {
        let dir = tempdir().unwrap();
        let url = "https://x.test/ok.jpg";
        let service =
            DownloadService::new(FakeFetcher::with(&[(url, 6000)]), DownloadConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        let result = service
            .fetch_with_events(
                vec![record("1", url), record("2", ""), record("3", "https://x.test/gone.jpg")],
                dir.path(),
                2,
                tx,
            )
            .await
            .unwrap();

        let mut completed = 0;
        let mut started = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                DownloadEvent::Started { .. } => started += 1,
                DownloadEvent::Completed { .. } => completed += 1,
                _ => {}
            }
        }
        assert_eq!(started, 3);
        assert_eq!(completed, result.downloaded);
        assert_eq!(result.total(), 3);
    }

    struct PanickingFetcher;

    #[async_trait]
    impl AssetFetcher for PanickingFetcher {
        async fn fetch_asset(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            panic!("fetcher blew up");
        }
    }

    #[tokio::test]
    async fn test_worker_panic_does_not_abort_run() {
        let dir = tempdir().unwrap();
        let service = DownloadService::new(PanickingFetcher, DownloadConfig::default());

        let result = service
            .fetch(vec![record("1", "https://x.test/a.jpg")], dir.path(), 1)
            .await
            .unwrap();

        assert_eq!(result.total(), 0);
    }
}
