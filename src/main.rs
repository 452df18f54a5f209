//! CLI entry point for picgrab.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use picgrab::HtmlImageExtractor;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > debug flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let settings = args.to_settings()?;
    info!(
        url = settings.target_url(),
        pages = settings.page_list().len(),
        threads = settings.thread_count(),
        dry_run = settings.debug_enabled(),
        "picgrab starting"
    );

    let parser = Arc::new(HtmlImageExtractor::new(
        settings.title_filter_words().to_vec(),
    ));
    let report = picgrab::run(settings, parser).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{json}");
    } else {
        println!();
        print!("{report}");
    }

    Ok(())
}
