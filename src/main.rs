use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pmc_crawler::config::load_env_file;
use pmc_crawler::{ClientConfig, CrawlRequest, CrawlSummary, Crawler, DateRange, SearchDb};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "pmc-crawler",
    version,
    about = "Download Open Access PDFs from PubMed Central",
    after_help = "Examples:\n  \
        pmc-crawler --query \"machine learning\"\n  \
        pmc-crawler --query \"COVID-19\" --max_results 50\n  \
        pmc-crawler --query \"cancer\" --start_date 2023/01/01 --end_date 2024/01/01"
)]
struct Cli {
    /// Search query
    #[arg(short, long)]
    query: String,

    /// Maximum number of search results to process
    #[arg(short, long = "max_results", default_value_t = 100)]
    max_results: usize,

    /// Output directory for PDFs and crawl_log.json
    #[arg(short, long, default_value = "downloads")]
    output: PathBuf,

    /// API key for NCBI E-utilities (increases rate limit)
    #[arg(short = 'k', long = "api_key", env = "NCBI_API_KEY")]
    api_key: Option<String>,

    /// Earliest publication date (YYYY/MM/DD)
    #[arg(long = "start_date")]
    start_date: Option<String>,

    /// Latest publication date (YYYY/MM/DD)
    #[arg(long = "end_date")]
    end_date: Option<String>,

    /// Email for NCBI requests (recommended)
    #[arg(long, env = "NCBI_EMAIL")]
    email: Option<String>,

    /// Database to search: pmc, or pubmed (hits mapped to PMC)
    #[arg(long, default_value = "pmc")]
    source: SearchDb,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn log_summary(summary: &CrawlSummary) {
    info!("Crawling complete");
    info!("  Query: {}", summary.query);
    info!("  Total found: {}", summary.total_found);
    info!("  Downloaded: {}", summary.downloaded);
    info!("  Failed: {}", summary.failed);
    info!("  Time: {}", summary.elapsed_time);
    info!("  Output: {}", summary.output_directory);
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = load_env_file(Path::new("."));

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = env_file {
        warn!(error = %e, "Ignoring unreadable .env file");
    }

    let date_range = DateRange::from_optional(cli.start_date.as_deref(), cli.end_date.as_deref())
        .context("Invalid publication date filter")?;

    let mut config = ClientConfig::new();
    if let Some(api_key) = &cli.api_key {
        config = config.with_api_key(api_key);
    }
    if let Some(email) = &cli.email {
        config = config.with_email(email);
    }

    let crawler = Crawler::new(config).context("Failed to create HTTP client")?;
    let request = CrawlRequest::new(&cli.query, &cli.output)
        .with_max_results(cli.max_results)
        .with_date_range(date_range)
        .with_source(cli.source);

    info!(query = %cli.query, source = %cli.source, "Starting PMC PDF crawl");

    match crawler.run(&request).await {
        Ok(summary) => {
            log_summary(&summary);
            Ok(())
        }
        Err(e) => {
            error!(query = %cli.query, error = %e, "Crawl aborted");
            Err(e).context("Crawl failed")
        }
    }
}
