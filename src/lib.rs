//! # PMC Crawler
//!
//! Downloads Open Access PDFs from PubMed Central.
//!
//! A crawl searches PMC (or PubMed) through the NCBI E-utilities, fetches
//! article metadata in batches, asks the PMC Open Access service for a
//! download link per article and saves each PDF under
//! `<output_dir>/<id>_<year>_<title>.pdf`. When only a `.tar.gz` package is
//! offered, the first PDF inside it is extracted. Every run ends with a
//! `crawl_log.json` summary in the output directory.
//!
//! ## Features
//!
//! - **Paced requests**: one shared HTTP session with a fixed delay before every
//!   request (340ms with an API key, 500ms without)
//! - **Retries**: transient failures are retried with exponential backoff
//! - **Resumable**: articles already on disk are skipped without any request
//!
//! ## Quick Start
//!
//! ```no_run
//! use pmc_crawler::{ClientConfig, CrawlRequest, Crawler, DateRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new().with_email("researcher@university.edu");
//!     let crawler = Crawler::new(config)?;
//!
//!     let request = CrawlRequest::new("CRISPR off-target", "downloads")
//!         .with_max_results(20)
//!         .with_date_range(DateRange::from_optional(Some("2023/01/01"), Some("2024/01/01"))?);
//!
//!     let summary = crawler.run(&request).await?;
//!     println!("Downloaded {} of {}", summary.downloaded, summary.total_found);
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod crawler;
pub mod error;
pub mod http;
pub mod pmc;
pub mod pubmed;
pub mod rate_limit;
pub mod retry;

// Re-export main types for convenience
pub use common::{ArticleRecord, DownloadLink, LinkFormat, PmcId, PubMedId};
pub use config::ClientConfig;
pub use crawler::{
    ArticleDownloader, CrawlRequest, CrawlSummary, Crawler, DownloadStatus, ResultRecord, RunLog,
};
pub use error::{CrawlerError, Result};
pub use http::HttpSession;
pub use pmc::PmcClient;
pub use pubmed::{DateRange, PubMedClient, SearchDb, SearchResult};
pub use rate_limit::RateLimiter;
pub use retry::RetryConfig;
