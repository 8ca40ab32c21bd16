//! CLI entry point for the coursedump tool.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use coursedump_core::{Archiver, Session, load_cookies_into_jar, parse_cookie_file};
use tracing::{debug, info};
use url::Url;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Coursedump starting");

    let base_url = Url::parse(&args.base_url)
        .with_context(|| format!("invalid base URL: {}", args.base_url))?;

    let cookie_file = File::open(&args.cookies)
        .with_context(|| format!("failed to open cookie file {}", args.cookies.display()))?;
    let cookies = parse_cookie_file(BufReader::new(cookie_file))
        .with_context(|| format!("failed to parse cookie file {}", args.cookies.display()))?;
    info!(cookies = cookies.len(), "loaded session cookies");

    let jar = load_cookies_into_jar(&cookies, &base_url);
    let session = Session::new(base_url, jar)?;

    let archiver = Archiver::new(session, &args.output, Duration::from_millis(args.delay_ms));
    let stats = archiver.run().await.context("failed to fetch dashboard")?;

    info!(
        files = stats.files_downloaded,
        pages = stats.pages_rendered,
        skipped = stats.items_skipped,
        failures = stats.failures,
        "Archive complete"
    );

    Ok(())
}
