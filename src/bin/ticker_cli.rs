// src/bin/ticker_cli.rs
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use std::path::PathBuf;

use ticker_meta_cache::source::{HttpJsonSource, JsonFileSource, TickerSource};
use ticker_meta_cache::types::{BuildReport, TickerRecord};
use ticker_meta_cache::{TickerMetaConfig, TickerMetaService};

#[derive(Parser)]
#[command(name = "ticker-cli")]
#[command(about = "Build and query the ticker autocomplete index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ResolveBy {
    Company,
    Ticker,
    Any,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every record from a JSON file or URL
    Build {
        #[arg(short, long, conflicts_with = "url")]
        file: Option<PathBuf>,
        #[arg(short, long)]
        url: Option<String>,
        #[arg(long)]
        token: Option<String>,
        /// Drop existing index entries first
        #[arg(long)]
        clear: bool,
    },
    Search {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
    },
    Resolve {
        query: String,
        #[arg(short, long, value_enum, default_value_t = ResolveBy::Company)]
        by: ResolveBy,
    },
    /// Remove every key under the configured namespace
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = TickerMetaConfig::from_env().context("Invalid configuration")?;
    let service = TickerMetaService::connect(&config).await?;

    match cli.command {
        Commands::Build { file, url, token, clear } => {
            let source: Box<dyn TickerSource> = match (file, url) {
                (Some(path), _) => Box::new(JsonFileSource::new(path)),
                (None, Some(url)) => Box::new(HttpJsonSource::new(url, token)?),
                (None, None) => bail!("build needs --file or --url"),
            };
            let report = service.builder.rebuild(source.as_ref(), clear).await?;
            print_report(&report);
        }
        Commands::Search { query, limit, offset, min, max } => {
            let defaults = config.search;
            let names = service
                .autocomplete
                .search(
                    &query,
                    min.unwrap_or(defaults.min_score),
                    max.unwrap_or(defaults.max_score),
                    offset,
                    limit.unwrap_or(defaults.limit),
                )
                .await?;

            if names.is_empty() {
                println!("No company names start with '{}'", query.trim());
            }
            for name in names {
                println!("{}", name);
            }
        }
        Commands::Resolve { query, by } => {
            let lookup = &service.lookup;
            let record = match by {
                ResolveBy::Company => lookup.resolve_by_company_name(&query).await?,
                ResolveBy::Ticker => lookup.resolve_by_ticker(&query).await?,
                ResolveBy::Any => lookup.resolve_any(&query).await?,
            };
            print_record(&query, record)?;
        }
        Commands::Clear => {
            let removed = service.builder.clear().await?;
            println!("🗑️ Removed {} keys under '{}'", removed, config.namespace);
        }
    }

    Ok(())
}

fn print_record(query: &str, record: Option<TickerRecord>) -> anyhow::Result<()> {
    match record {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => {
            eprintln!("❌ No ticker found for '{}'", query.trim());
            std::process::exit(1);
        }
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    println!("✅ Build {} finished", report.run_id);
    println!("  cleared keys:     {}", report.cleared_keys);
    println!("  records seen:     {}", report.records_seen);
    println!("  records indexed:  {}", report.records_indexed);
    println!("  records rejected: {}", report.records_rejected);
    println!("  records failed:   {}", report.records_failed);
    println!("  source errors:    {}", report.source_errors);
    if let Some(ms) = report.duration_ms() {
        println!("  duration:         {}ms", ms);
    }
}
