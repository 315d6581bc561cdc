mod cache;
mod classify;
mod crawl;
mod export;
mod fetch;
mod model;
mod parser;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use cache::{CacheStore, CachedFetcher};
use crawl::{CrawlReport, Crawler};
use export::Exporter;
use fetch::{HttpFetcher, OfflineFetcher, PageFetcher};
use settings::Settings;

#[derive(Parser)]
#[command(name = "formables", about = "Find EU4 formable nations with permanent mission rewards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl formables, missions and events, then write the CSV
    Run {
        /// CSV output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory holding cached pages
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Only process the first N formables
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Also write the enriched dataset as JSON
        #[arg(long)]
        dump: Option<PathBuf>,
        /// Never touch the network; fail on a cache miss
        #[arg(long)]
        offline: bool,
    },
    /// Show cache statistics
    Cache {
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    match cli.command {
        Commands::Run {
            output,
            cache_dir,
            limit,
            dump,
            offline,
        } => {
            if let Some(path) = output {
                settings.output = path;
            }
            if let Some(dir) = cache_dir {
                settings.cache_dir = dir;
            }

            let report = if offline {
                crawl_with(&settings, OfflineFetcher, limit).await?
            } else {
                crawl_with(&settings, HttpFetcher::new(&settings)?, limit).await?
            };

            if let Some(path) = dump {
                let json = serde_json::to_string_pretty(&report.entities)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Dataset written to {}", path.display());
            }

            print_report(&report, &settings);
        }
        Commands::Cache { cache_dir } => {
            let root = cache_dir.unwrap_or(settings.cache_dir);
            let stats = cache::stats_at(&root)?;
            println!("Cache:   {}", root.display());
            println!("Entries: {}", stats.entries);
            println!("Size:    {:.1} KiB", stats.bytes as f64 / 1024.0);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}

async fn crawl_with<F: PageFetcher>(
    settings: &Settings,
    fetcher: F,
    limit: Option<usize>,
) -> Result<CrawlReport> {
    let store = CacheStore::open(&settings.cache_dir)?;
    let crawler = Crawler::new(CachedFetcher::new(store, fetcher, settings.host.as_str()));
    let mut exporter = Exporter::create(&settings.output, &settings.host)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let report = crawl::run(crawler, &mut exporter, &settings.listing_path, limit, &pb).await?;
    exporter.into_inner()?;
    Ok(report)
}

fn print_report(report: &CrawlReport, settings: &Settings) {
    let tasks = report.entities.iter().flat_map(|e| &e.tasks);
    let events = tasks.clone().filter(|t| t.has_event()).count();
    println!(
        "Crawled {} formables ({} missions, {} with events), exported {} to {}",
        report.entities.len(),
        tasks.count(),
        events,
        report.exported,
        settings.output.display()
    );
    println!(
        "Cache: {} hits, {} fetched",
        report.cache_hits, report.cache_misses
    );

    if !report.skipped.is_empty() {
        println!("\nSkipped {} items:", report.skipped.len());
        for s in &report.skipped {
            match &s.entity {
                Some(name) => println!("  {}: {}", name, s.reason),
                None => println!("  {}", s.reason),
            }
        }
    }
}
