//! Deepcrawl main entry point
//!
//! This is the command-line interface for the Deepcrawl site crawler.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use deepcrawl::config::{load_project, ProjectConfig};
use deepcrawl::{Crawler, RunOptions};
use tracing_subscriber::EnvFilter;

/// Deepcrawl: a single-domain deep web crawler
///
/// Deepcrawl walks a website breadth-first from the start URL of a project
/// file, extracts the fields named in its selectors from every page, and
/// exports and caches the results.
#[derive(Parser, Debug)]
#[command(name = "deepcrawl")]
#[command(version)]
#[command(about = "A single-domain deep web crawler", long_about = None)]
struct Cli {
    /// Path to TOML project file
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Sort results by URL
    #[arg(long)]
    sort: bool,

    /// Keep the raw HTML of pages after extraction
    #[arg(long)]
    keep_raw: bool,

    /// Print the results as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Validate the project and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["dump_cache", "clear_cache"])]
    dry_run: bool,

    /// Write the cached pages to a JSON file and exit
    #[arg(long, value_name = "PATH", num_args = 0..=1, conflicts_with_all = ["dry_run", "clear_cache"])]
    dump_cache: Option<Option<PathBuf>>,

    /// Empty the cache and exit
    #[arg(long, conflicts_with_all = ["dry_run", "dump_cache"])]
    clear_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading project from: {}", cli.project.display());
    let project = load_project(&cli.project)
        .with_context(|| format!("Failed to load project {}", cli.project.display()))?;

    if cli.dry_run {
        handle_dry_run(&project);
        return Ok(());
    }

    let mut crawler = Crawler::from_project(&project)?;

    if let Some(path) = &cli.dump_cache {
        handle_dump_cache(&crawler, path.as_deref())?;
    } else if cli.clear_cache {
        let removed = crawler.clear_cache()?;
        println!("Removed {} cached pages", removed);
    } else {
        let options = RunOptions {
            verbose: cli.verbose > 0,
            sort_results: cli.sort,
            keep_raw_content: cli.keep_raw,
            force_caching: false,
        };
        handle_crawl(&mut crawler, options, cli.json).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("deepcrawl=info,warn"),
            1 => EnvFilter::new("deepcrawl=debug,info"),
            2 => EnvFilter::new("deepcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the project as it would be crawled
fn handle_dry_run(project: &ProjectConfig) {
    let settings = &project.settings;

    println!("=== Deepcrawl Dry Run ===\n");
    println!("Start URL: {}", project.start_url);

    println!("\nSettings:");
    println!("  Max depth: {}", settings.max_depth);
    println!("  Max concurrency: {}", settings.max_concurrency);
    println!("  Download delay: {}s", settings.download_delay);
    println!("  Request timeout: {}s", settings.request_timeout);
    println!("  Language: {}", settings.language);
    println!("  Link filter: {:?}", settings.link_filter);
    println!("  Caching: {}", settings.caching_enabled());
    println!("  Delta crawl: {}", settings.delta_crawl);

    println!("\nExporters ({}):", settings.exporters.len());
    for exporter in &settings.exporters {
        println!("  - {} -> {}", exporter.name(), settings.export_to.display());
    }

    println!("\nSelectors ({}):", project.selectors.len());
    for (field, query) in &project.selectors {
        println!("  - {}: {}", field, query);
    }

    println!("\n✓ Project is valid");
}

fn handle_dump_cache(crawler: &Crawler, path: Option<&Path>) -> anyhow::Result<()> {
    let written = crawler.dump_cache(path)?;
    println!("✓ Cache dumped to: {}", written.display());
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(crawler: &mut Crawler, options: RunOptions, json: bool) -> anyhow::Result<()> {
    let outcome = crawler.run(options).await;

    if json {
        println!("{}", serde_json::to_string_pretty(crawler.results())?);
    }

    match outcome {
        Ok(()) => {
            tracing::info!("Crawl of {} completed", crawler.domain());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
