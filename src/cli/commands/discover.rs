//! Discover command and the discovery stage shared with `scrape`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;

use pinacquire::config::{expand_path, Settings};
use pinacquire::discovery::{DiscoveryLoop, DiscoveryReport, PinterestSource};
use pinacquire::manifest::{manifest_path, write_manifest};
use pinacquire::models::Section;
use pinacquire::scrapers::HttpClient;

use crate::cli::helpers::{default_output_dir, profile_id_from_reference};

/// Resolve the profile name or fail with a readable message.
pub(super) fn resolve_profile(reference: &str) -> anyhow::Result<String> {
    profile_id_from_reference(reference)
        .with_context(|| format!("Cannot derive a profile name from '{}'", reference))
}

/// Run discovery for a profile section and report progress on the console.
pub(super) async fn discover_profile(
    settings: &Settings,
    client: &HttpClient,
    profile: &str,
    section: Section,
    debug: bool,
) -> DiscoveryReport {
    println!(
        "{} Discovering pins for {} ({})",
        style("→").cyan(),
        style(profile).bold(),
        section
    );

    let source = PinterestSource::new(client.clone()).with_body_dumps(debug);
    let discovery = DiscoveryLoop::with_options(source, settings.discovery_options());
    let report = discovery.discover_with_report(profile, section).await;

    tracing::info!(
        "Discovery finished: {} records, {} seeded, {} pages, stopped on {}{}",
        report.records.len(),
        report.seeded,
        report.pages,
        report.stop_reason,
        if report.used_fallback { ", full page fallback used" } else { "" }
    );

    if report.records.is_empty() {
        println!("{} No pins found", style("!").yellow());
        println!(
            "  {} Re-run with --debug to inspect the raw responses",
            style("→").dim()
        );
    } else {
        println!(
            "{} Found {} pins",
            style("✓").green(),
            report.records.len()
        );
    }

    report
}

/// Create the output directory, defaulting to `pinterest_<profile>_<section>`.
pub(super) async fn prepare_output_dir(
    output: Option<PathBuf>,
    profile: &str,
    section: Section,
) -> anyhow::Result<PathBuf> {
    let dir = match output {
        Some(path) => expand_path(&path),
        None => default_output_dir(profile, section),
    };
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    Ok(dir)
}

/// Write the manifest for discovered records and say where it went.
pub(super) async fn save_manifest(
    output_dir: &Path,
    report: &DiscoveryReport,
) -> anyhow::Result<PathBuf> {
    let path = manifest_path(output_dir);
    write_manifest(&path, &report.records).await?;
    println!(
        "{} Saved {} records to {}",
        style("✓").green(),
        report.records.len(),
        path.display()
    );
    Ok(path)
}

/// Discover a profile section and write `pins.json`.
pub async fn cmd_discover(
    settings: &Settings,
    reference: &str,
    section: Section,
    output: Option<PathBuf>,
    debug: bool,
) -> anyhow::Result<()> {
    let profile = resolve_profile(reference)?;
    let client = HttpClient::with_user_agent(settings.timeouts(), settings.user_agent.as_deref())?;

    let report = discover_profile(settings, &client, &profile, section, debug).await;
    if report.records.is_empty() {
        return Ok(());
    }

    let output_dir = prepare_output_dir(output, &profile, section).await?;
    save_manifest(&output_dir, &report).await?;
    Ok(())
}
