//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod discover;
mod download;
mod scrape;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pinacquire::config::{expand_path, load_settings};
use pinacquire::models::Section;

use super::helpers::parse_concurrency;

#[derive(Parser)]
#[command(name = "pinacquire")]
#[command(about = "Discover and download the media of a Pinterest profile")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(long, global = true, env = "PINACQUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging, including truncated raw page and API bodies
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Check if debug mode is enabled (for early logging setup).
pub fn is_debug() -> bool {
    std::env::args().any(|arg| arg == "--debug")
}

#[derive(Subcommand)]
enum Commands {
    /// Discover a profile's pins and download them
    Scrape {
        /// Profile URL or username
        profile: String,
        /// Profile section to harvest
        #[arg(short, long, value_enum, default_value_t = Section::Created)]
        section: Section,
        /// Output directory (default: pinterest_<profile>_<section>)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Concurrent downloads
        #[arg(short, long, value_parser = parse_concurrency)]
        concurrency: Option<usize>,
        /// Also write the discovered records to pins.json
        #[arg(long)]
        save_urls: bool,
        /// Disable the progress display
        #[arg(long)]
        no_progress: bool,
    },

    /// Discover a profile's pins and write pins.json (does not download)
    Discover {
        /// Profile URL or username
        profile: String,
        /// Profile section to harvest
        #[arg(short, long, value_enum, default_value_t = Section::Created)]
        section: Section,
        /// Output directory (default: pinterest_<profile>_<section>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download the records listed in a pins.json manifest
    Download {
        /// Manifest written by `discover` or `scrape --save-urls`
        manifest: PathBuf,
        /// Output directory (default: the manifest's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Concurrent downloads
        #[arg(short, long, value_parser = parse_concurrency)]
        concurrency: Option<usize>,
        /// Disable the progress display
        #[arg(long)]
        no_progress: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().map(expand_path);
    let (mut settings, _config) = load_settings(config_path.as_deref()).await?;

    match cli.command {
        Commands::Scrape {
            profile,
            section,
            output,
            concurrency,
            save_urls,
            no_progress,
        } => {
            if let Some(n) = concurrency {
                settings.concurrency = n;
            }
            scrape::cmd_scrape(
                &settings,
                &profile,
                section,
                output,
                save_urls,
                !no_progress,
                cli.debug,
            )
            .await
        }
        Commands::Discover {
            profile,
            section,
            output,
        } => discover::cmd_discover(&settings, &profile, section, output, cli.debug).await,
        Commands::Download {
            manifest,
            output,
            concurrency,
            no_progress,
        } => {
            if let Some(n) = concurrency {
                settings.concurrency = n;
            }
            download::cmd_download(&settings, &manifest, output, !no_progress).await
        }
    }
}
