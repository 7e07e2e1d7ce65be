mod archive;
mod extract;
mod fetch;
mod platform;
mod reconcile;
mod settings;
mod table;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use extract::{ExtractionResult, Extractor};
use fetch::HttpFetcher;
use platform::Platform;
use reconcile::{ReconcileOptions, TablePaths};
use settings::Settings;

const DEFAULT_CSV: &str = "urls.csv";
const SINGLE_URL_OUTPUT: &str = "extracted_content.json";

#[derive(Parser)]
#[command(
    name = "social_scraper",
    about = "Extract titles, authors and content from social media URLs",
    after_help = "Completed rows move to <platform>.csv (newest first) unless --no-move is given.\n\
                  Set YOUTUBE_API_KEY / TWITTER_BEARER_TOKEN to use the platform APIs."
)]
struct Cli {
    /// Single URL to process (processes urls.csv when omitted)
    #[arg(conflicts_with = "csv")]
    url: Option<String>,

    /// CSV file containing URLs
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Only process URLs from this platform
    #[arg(long, value_enum)]
    platform: Option<Platform>,

    /// Process all rows, even if title/author/content already exist
    #[arg(long)]
    force: bool,

    /// Output CSV path (default: overwrite the input file)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Keep completed rows in the input table instead of moving them
    #[arg(long)]
    no_move: bool,

    /// Directory holding the per-platform archive tables
    #[arg(long, default_value = ".")]
    archive_dir: PathBuf,

    /// Also retry rows a previous run left as platform=error
    #[arg(long)]
    retry_errors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    let fetcher = Arc::new(HttpFetcher::new(&settings)?);
    let extractor = Extractor::new(fetcher, settings);

    match cli.url {
        Some(url) => extract_single(&extractor, &url).await?,
        None => {
            let input = cli.csv.unwrap_or_else(|| PathBuf::from(DEFAULT_CSV));
            if !input.exists() {
                bail!("CSV file not found: {}", input.display());
            }
            let paths = TablePaths {
                input,
                output: cli.output,
                archive_dir: cli.archive_dir,
            };
            let opts = ReconcileOptions {
                platform: cli.platform,
                force_all: cli.force,
                move_completed: !cli.no_move,
                retry_errors: cli.retry_errors,
            };
            reconcile::process_table(&paths, &opts, &extractor).await?;
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct SingleUrlDocument<'a> {
    #[serde(flatten)]
    result: &'a ExtractionResult,
    extracted_at: chrono::DateTime<chrono::Utc>,
}

async fn extract_single(extractor: &Extractor, url: &str) -> anyhow::Result<()> {
    info!("Extracting content from: {}", url);
    let result = extractor.extract(url).await;

    println!("\n{}", "=".repeat(80));
    println!("Platform: {}", result.platform);
    println!("URL: {}", result.url);
    println!("Title: {}", result.title);
    println!("Author: {}", result.author);
    println!("Content Preview: {}...", truncate(&result.content, 200));
    println!("{}\n", "=".repeat(80));

    let doc = SingleUrlDocument { result: &result, extracted_at: chrono::Utc::now() };
    let json = serde_json::to_string_pretty(&doc)?;
    std::fs::write(SINGLE_URL_OUTPUT, json)
        .with_context(|| format!("Failed to write {}", SINGLE_URL_OUTPUT))?;
    info!("Full result saved to {}", SINGLE_URL_OUTPUT);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
