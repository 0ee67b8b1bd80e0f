//! forum-crawler main entry point
//!
//! This is the command-line interface for the forum crawler.

use anyhow::{Context, Result};
use clap::Parser;
use forum_crawler::config::{load_config, Config, CrawlMode};
use forum_crawler::crawler::{Coordinator, HttpFetcher, RunOptions};
use forum_crawler::output::{print_summary, FileSaver};
use forum_crawler::publish::{commit_message, publish_results, PublishOutcome};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// forum-crawler: saves pictures and novels from a paginated forum
///
/// Walks the listing pages of every configured forum, visits each topic and
/// stores either its images or its text. Results can be pushed to a git
/// remote afterwards.
#[derive(Parser, Debug)]
#[command(name = "forum-crawler")]
#[command(version)]
#[command(about = "Crawls a paginated forum and saves pictures or novels", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Content to crawl; overrides `crawl-mode` from the configuration
    #[arg(short, long, value_enum)]
    mode: Option<CrawlMode>,

    /// Only process topics tagged with today's date, e.g. [06-01]
    #[arg(long)]
    daily: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let mode = cli.mode.unwrap_or(config.crawl_mode);
    let options = RunOptions::today(cli.daily);

    if cli.dry_run {
        handle_dry_run(&config, mode, options);
        return Ok(());
    }

    handle_crawl(config, mode, options).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forum_crawler=info,warn"),
            1 => EnvFilter::new("forum_crawler=debug,info"),
            2 => EnvFilter::new("forum_crawler=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration and the forums to crawl
fn handle_dry_run(config: &Config, mode: CrawlMode, options: RunOptions) {
    println!("=== forum-crawler Dry Run ===\n");

    println!("Site:");
    println!("  Origin: {}", config.origin());
    println!("  Topic marker: {}", config.topic_path_marker);
    println!("  Forum marker: {}", config.forum_path_marker);

    println!("\nRun:");
    println!("  Mode: {}", mode);
    println!("  Daily: {}", options.daily);
    if options.daily {
        println!("  Date tag: [{}]", options.run_date.format("%m-%d"));
    }
    println!("  Max pages per forum: {}", config.crawl.max_pages);

    println!("\nRequests:");
    println!("  Timeout: {}s", config.request.timeout_secs);
    println!("  Delay: {}ms", config.request.delay_ms);
    println!("  Retries: {}", config.crawl.retry_times);
    println!("  Bypass system proxy: {}", config.request.bypass_system_proxy);
    for (name, proxy) in [
        ("HTTP proxy", &config.request.http_proxy),
        ("HTTPS proxy", &config.request.https_proxy),
    ] {
        if let Some(proxy) = proxy {
            println!("  {}: {}", name, proxy);
        }
    }

    let save_paths = config.save_paths.for_run(options.daily, options.run_date);
    println!("\nSave paths:");
    println!("  Picture: {}", save_paths.picture.display());
    println!("  Novel: {}", save_paths.novel.display());

    let mut forum_count = 0;
    for pass in mode.passes() {
        let forums = config.forums_for(pass);
        forum_count += forums.len();

        println!("\n{} forums ({}):", pass, forums.len());
        for forum in forums {
            println!("  - {} [{}] {}", forum.name, forum.id, config.forum_url(forum));
        }
    }

    println!("\nRemote repository:");
    if config.remote_repo.enable {
        println!("  {} ({})", config.remote_repo.url, config.remote_repo.branch);
    } else {
        println!("  disabled");
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} forums", forum_count);
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, mode: CrawlMode, options: RunOptions) -> Result<()> {
    let save_paths = config.save_paths.for_run(options.daily, options.run_date);
    let remote = config.remote_repo.clone();
    let roots = config.save_paths.roots();

    let fetcher = HttpFetcher::from_config(&config.request, &config.crawl)
        .context("Failed to build HTTP client")?;
    let sink = FileSaver::create(save_paths)
        .await
        .context("Failed to create save directories")?;
    let coordinator = Coordinator::new(config, fetcher, sink, options)?;

    let summary = coordinator.run(mode).await;
    print_summary(&summary);

    let message = commit_message(mode, options.daily, summary.total().items_saved);
    match publish_results(&remote, Path::new("."), &roots, &message).await {
        PublishOutcome::Disabled => tracing::debug!("Remote push disabled"),
        PublishOutcome::Skipped(reason) => tracing::warn!("Remote push skipped: {}", reason),
        PublishOutcome::Pushed => tracing::info!("Results pushed to {}", remote.url),
        PublishOutcome::Failed(reason) => tracing::warn!("Remote push failed: {}", reason),
    }

    Ok(())
}
