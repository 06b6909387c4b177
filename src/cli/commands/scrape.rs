//! Scrape command: discovery followed by downloads.

use std::path::PathBuf;

use pinacquire::config::Settings;
use pinacquire::models::Section;
use pinacquire::scrapers::HttpClient;

use super::discover::{discover_profile, prepare_output_dir, resolve_profile, save_manifest};
use super::download::{download_records, print_summary};

/// Discover every pin in a profile section and download it.
pub async fn cmd_scrape(
    settings: &Settings,
    reference: &str,
    section: Section,
    output: Option<PathBuf>,
    save_urls: bool,
    show_progress: bool,
    debug: bool,
) -> anyhow::Result<()> {
    let profile = resolve_profile(reference)?;
    let client = HttpClient::with_user_agent(settings.timeouts(), settings.user_agent.as_deref())?;

    let report = discover_profile(settings, &client, &profile, section, debug).await;
    if report.records.is_empty() {
        return Ok(());
    }

    let output_dir = prepare_output_dir(output, &profile, section).await?;
    if save_urls {
        save_manifest(&output_dir, &report).await?;
    }

    let result =
        download_records(settings, client, report.records, &output_dir, show_progress).await?;
    print_summary(&result, &output_dir);
    Ok(())
}
