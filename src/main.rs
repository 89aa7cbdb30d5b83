//! Sumi-Trawl main entry point
//!
//! This is the command-line interface for the Sumi-Trawl link graph crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_trawl::config::{load_config_with_hash, Config};
use sumi_trawl::crawler::run_crawl;
use sumi_trawl::output::{load_statistics, print_statistics};
use sumi_trawl::storage::open_storage;
use tracing_subscriber::EnvFilter;

/// Sumi-Trawl: a breadth-first link graph crawler
///
/// Sumi-Trawl crawls outward from a set of seed URLs one depth round at a
/// time, recording every discovered URL with its referrer and depth in a
/// SQLite database. Re-running against the same database resumes from
/// whatever is still uncrawled.
#[derive(Parser, Debug)]
#[command(name = "sumi-trawl")]
#[command(version)]
#[command(about = "A breadth-first link graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Override the number of rounds from the config (0 = until done)
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_trawl=info,warn"),
            1 => EnvFilter::new("sumi_trawl=debug,info"),
            2 => EnvFilter::new("sumi_trawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn describe_limit(value: u32, unlimited: &str) -> String {
    if value == 0 {
        unlimited.to_string()
    } else {
        value.to_string()
    }
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Trawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max depth: {}",
        describe_limit(config.crawler.max_depth, "until frontier is empty")
    );
    println!(
        "  Batch size: {}",
        describe_limit(config.crawler.batch_size, "whole frontier")
    );
    println!(
        "  Max fetch attempts: {}",
        describe_limit(config.crawler.max_fetch_attempts, "unlimited")
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    match config.active_auth() {
        Some(auth) => println!(
            "\nAuthentication: log in as {} at {}",
            auth.username, auth.login_endpoint
        ),
        None => println!("\nAuthentication: disabled"),
    }

    match config.active_images() {
        Some(images) => {
            let threshold = images
                .min_size
                .map(|size| format!("{} bytes", size))
                .unwrap_or_else(|| "none".to_string());
            println!(
                "Image capture: into {} (min size: {})",
                images.media_dir, threshold
            );
        }
        None => println!("Image capture: disabled"),
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_storage(Path::new(&config.output.database_path))
        .context("failed to open database")?;

    let max_attempts = Some(config.crawler.max_fetch_attempts).filter(|&n| n > 0);
    let stats = load_statistics(&store, max_attempts).context("failed to load statistics")?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!("Seed URLs: {}", config.seeds.len());

    let report = run_crawl(config, config_hash).await.map_err(|e| {
        tracing::error!("Crawl failed: {}", e);
        e
    })?;

    tracing::info!(
        "Crawl completed: {} rounds, {} pages crawled, {} failed fetches, {} new URLs, {} images saved",
        report.rounds,
        report.pages_crawled,
        report.fetch_failures,
        report.links_inserted,
        report.images_saved
    );

    Ok(())
}
