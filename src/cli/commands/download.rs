//! Download command and the download stage shared with `scrape`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use console::style;
use tokio::sync::mpsc;

use pinacquire::config::{expand_path, Settings};
use pinacquire::discovery::PINTEREST_BASE;
use pinacquire::manifest::read_manifest;
use pinacquire::models::ContentRecord;
use pinacquire::scrapers::HttpClient;
use pinacquire::services::{DownloadEvent, DownloadResult, DownloadService};

use crate::cli::helpers::manifest_dir;
use crate::cli::progress::DownloadProgress;

/// Fetch assets for `records` into `output_dir`, with optional progress bars.
pub(super) async fn download_records(
    settings: &Settings,
    client: HttpClient,
    records: Vec<ContentRecord>,
    output_dir: &Path,
    show_progress: bool,
) -> anyhow::Result<DownloadResult> {
    let workers = settings.concurrency.max(1);
    let total = records.len();

    println!(
        "{} Downloading {} pins with {} workers",
        style("→").cyan(),
        total,
        workers
    );

    let client = client.with_referer(format!("{}/", PINTEREST_BASE));
    let service = DownloadService::new(client, settings.download_config());

    // Event channel for progress updates
    let (event_tx, mut event_rx) = mpsc::channel::<DownloadEvent>(100);

    let progress_display = if show_progress {
        Some(Arc::new(DownloadProgress::new(workers.min(total), total as u64)))
    } else {
        None
    };

    // Spawn event handler task (UI layer)
    let progress_clone = progress_display.clone();
    let event_handler = tokio::spawn(async move {
        let mut downloaded = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;

        while let Some(event) = event_rx.recv().await {
            match event {
                DownloadEvent::Started {
                    worker_id,
                    filename,
                    ..
                } => {
                    if let Some(ref progress) = progress_clone {
                        progress.start_download(worker_id, &filename).await;
                    }
                }
                DownloadEvent::Completed { worker_id, .. } => {
                    downloaded += 1;
                    if let Some(ref progress) = progress_clone {
                        progress.set_summary(downloaded, skipped, failed);
                        progress.finish_download(worker_id).await;
                    }
                }
                DownloadEvent::AlreadyPresent { worker_id, .. } => {
                    skipped += 1;
                    if let Some(ref progress) = progress_clone {
                        progress.set_summary(downloaded, skipped, failed);
                        progress.finish_download(worker_id).await;
                    }
                }
                DownloadEvent::InvalidUrl { worker_id, id } => {
                    tracing::debug!("Pin {} has no usable URL", id);
                    if let Some(ref progress) = progress_clone {
                        progress.finish_download(worker_id).await;
                    }
                }
                DownloadEvent::Failed {
                    worker_id,
                    id,
                    error,
                } => {
                    failed += 1;
                    let message = format!("{} Failed to download pin {}: {}", style("✗").red(), id, error);
                    if let Some(ref progress) = progress_clone {
                        progress.println(&message);
                        progress.set_summary(downloaded, skipped, failed);
                        progress.finish_download(worker_id).await;
                    } else {
                        eprintln!("{}", message);
                    }
                }
            }
        }
    });

    let result = service
        .fetch_with_events(records, output_dir, workers, event_tx)
        .await?;

    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }

    if let Some(ref progress) = progress_display {
        progress.finish().await;
    }

    Ok(result)
}

/// Print the run summary.
pub(super) fn print_summary(result: &DownloadResult, output_dir: &Path) {
    println!(
        "{} Downloaded {} pins",
        style("✓").green(),
        result.downloaded
    );
    if result.skipped > 0 {
        println!("  {} {} already present", style("→").dim(), result.skipped);
    }
    if result.invalid > 0 {
        println!("  {} {} without a usable URL", style("!").yellow(), result.invalid);
    }
    if result.failed > 0 {
        println!("  {} {} failed", style("✗").red(), result.failed);
    }
    let shown = std::fs::canonicalize(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
    println!("  {} Saved in {}", style("→").dim(), shown.display());
}

/// Download the records listed in a manifest.
pub async fn cmd_download(
    settings: &Settings,
    manifest: &Path,
    output: Option<PathBuf>,
    show_progress: bool,
) -> anyhow::Result<()> {
    let manifest = expand_path(manifest);
    let records = read_manifest(&manifest)
        .await
        .with_context(|| format!("Failed to load manifest {}", manifest.display()))?;

    if records.is_empty() {
        println!("{} Manifest lists no pins", style("!").yellow());
        return Ok(());
    }

    let output_dir = match output {
        Some(path) => expand_path(&path),
        None => manifest_dir(&manifest),
    };
    let client = HttpClient::with_user_agent(settings.timeouts(), settings.user_agent.as_deref())?;

    let result = download_records(settings, client, records, &output_dir, show_progress).await?;
    print_summary(&result, &output_dir);
    Ok(())
}
