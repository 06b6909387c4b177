//! Multi-progress display for concurrent downloads.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

/// One summary bar plus an activity line per worker.
pub struct DownloadProgress {
    multi: MultiProgress,
    slots: Mutex<Vec<ProgressBar>>,
    summary_bar: ProgressBar,
}

fn idle_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("  {spinner:.dim} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn active_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("  {spinner:.cyan} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl DownloadProgress {
    /// Create a display with `num_workers` activity lines for `total` records.
    pub fn new(num_workers: usize, total: u64) -> Self {
        let multi = MultiProgress::new();

        let summary_bar = multi.add(ProgressBar::new(total));
        summary_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        summary_bar.set_message("Downloading");

        let slots = (0..num_workers)
            .map(|_| {
                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(idle_style());
                bar.set_message("idle");
                bar
            })
            .collect();

        Self {
            multi,
            slots: Mutex::new(slots),
            summary_bar,
        }
    }

    /// Show what a worker is fetching.
    pub async fn start_download(&self, worker_id: usize, filename: &str) {
        let slots = self.slots.lock().await;
        if let Some(bar) = slots.get(worker_id) {
            bar.set_style(active_style());
            bar.set_message(truncate_filename(filename, 40));
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
        }
    }

    /// Return a worker's line to idle and advance the summary.
    pub async fn finish_download(&self, worker_id: usize) {
        let slots = self.slots.lock().await;
        if let Some(bar) = slots.get(worker_id) {
            bar.disable_steady_tick();
            bar.set_style(idle_style());
            bar.set_message("idle");
        }
        self.summary_bar.inc(1);
    }

    /// Update the summary message.
    pub fn set_summary(&self, downloaded: usize, skipped: usize, failed: usize) {
        self.summary_bar.set_message(format!(
            "Downloaded: {} | Present: {} | Failed: {}",
            downloaded, skipped, failed
        ));
    }

    /// Finish all progress bars and clear the display.
    pub async fn finish(&self) {
        let slots = self.slots.lock().await;
        for bar in slots.iter() {
            bar.finish_and_clear();
        }
        self.summary_bar.finish_and_clear();
    }

    /// Print a message without corrupting the progress bars.
    pub fn println(&self, message: &str) {
        let _ = self.multi.println(message);
    }
}

/// Truncate a filename for display, keeping the extension visible.
fn truncate_filename(name: &str, max_chars: usize) -> String {
    let len = name.chars().count();
    if len <= max_chars {
        return name.to_string();
    }

    if let Some(dot_pos) = name.rfind('.') {
        let ext = &name[dot_pos..];
        let ext_len = ext.chars().count();
        if ext_len + 4 < max_chars {
            let prefix: String = name.chars().take(max_chars - ext_len - 3).collect();
            return format!("{}...{}", prefix, ext);
        }
    }

    let prefix: String = name.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", prefix)
}
