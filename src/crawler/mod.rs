//! Crawl pipeline: search, fetch metadata, download each article, write the run log
//!
//! Everything runs sequentially on one [`HttpSession`], so at most one request
//! is in flight at a time and the session's delay paces the whole run.

pub mod download;
pub mod filename;
pub mod log;

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use crate::common::{ArticleRecord, PmcId, PubMedId, UNKNOWN};
use crate::config::ClientConfig;
use crate::error::{CrawlerError, Result};
use crate::http::HttpSession;
use crate::pmc::PmcClient;
use crate::pubmed::{DateRange, PubMedClient, SearchDb};

pub use download::{ArticleDownloader, DownloadStatus};
pub use filename::{MAX_TITLE_LENGTH, article_filename, sanitize_filename};
pub use log::{CrawlSummary, LOG_FILE_NAME, ResultRecord, RunLog};

/// Parameters of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub query: String,
    pub max_results: usize,
    pub date_range: Option<DateRange>,
    /// Database searched; PubMed hits are mapped to PMC before downloading
    pub source: SearchDb,
    pub output_dir: PathBuf,
}

impl CrawlRequest {
    pub fn new(query: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            query: query.into(),
            max_results: 100,
            date_range: None,
            source: SearchDb::Pmc,
            output_dir: output_dir.into(),
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_date_range(mut self, date_range: Option<DateRange>) -> Self {
        self.date_range = date_range;
        self
    }

    pub fn with_source(mut self, source: SearchDb) -> Self {
        self.source = source;
        self
    }
}

/// One article queued for download
struct WorkItem {
    /// Identifier reported in the run log
    log_id: String,
    /// `None` when a hit is malformed or a PubMed hit has no PMC counterpart
    pmcid: Option<PmcId>,
    record: ArticleRecord,
}

impl WorkItem {
    /// A search hit with no usable identifier; logged as `no_oa_link` under its raw id
    fn unresolved(raw_id: &str) -> Self {
        let mut record = ArticleRecord::placeholder(raw_id);
        record.year = UNKNOWN.to_string();
        Self {
            log_id: raw_id.to_string(),
            pmcid: None,
            record,
        }
    }
}

/// Runs complete crawls over a shared session
///
/// # Example
///
/// ```no_run
/// use pmc_crawler::{ClientConfig, CrawlRequest, Crawler};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let crawler = Crawler::new(ClientConfig::new())?;
///     let request = CrawlRequest::new("machine learning", "downloads").with_max_results(10);
///     let summary = crawler.run(&request).await?;
///     println!("{} of {} downloaded", summary.downloaded, summary.total_found);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Crawler {
    pubmed: PubMedClient,
    pmc: PmcClient,
    downloader: ArticleDownloader,
}

impl Crawler {
    /// Create a crawler with its own HTTP session
    ///
    /// # Errors
    ///
    /// * `CrawlerError::RequestError` - If the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_session(HttpSession::new(config)?))
    }

    pub fn with_session(session: HttpSession) -> Self {
        Self {
            pubmed: PubMedClient::new(session.clone()),
            pmc: PmcClient::new(session.clone()),
            downloader: ArticleDownloader::new(session),
        }
    }

    /// Run one crawl and write `crawl_log.json` into the output directory
    ///
    /// Per-article failures are recorded in the summary and never abort the run.
    ///
    /// # Errors
    ///
    /// * `CrawlerError::NoSearchResults` - If the search failed or found nothing
    /// * `CrawlerError::IoError` - If the output directory or run log cannot be written
    #[instrument(skip(self, request), fields(query = %request.query, source = %request.source))]
    pub async fn run(&self, request: &CrawlRequest) -> Result<CrawlSummary> {
        let started = Instant::now();

        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|e| CrawlerError::io("Failed to create output directory", e))?;

        let ids = match self
            .pubmed
            .search(
                &request.query,
                request.source,
                request.max_results,
                request.date_range.as_ref(),
            )
            .await
        {
            Ok(result) => result.ids,
            Err(e) => {
                error!(error = %e, "Search failed");
                Vec::new()
            }
        };

        if ids.is_empty() {
            return Err(CrawlerError::NoSearchResults {
                query: request.query.clone(),
            });
        }

        let items = match request.source {
            SearchDb::Pmc => self.prepare_pmc_items(&ids).await,
            SearchDb::PubMed => self.prepare_pubmed_items(&ids).await,
        };

        let total_found = ids.len();
        let total = items.len();
        info!(total, "Downloading PDFs");

        let mut run_log = RunLog::new();
        for (index, item) in items.into_iter().enumerate() {
            info!("[{}/{}] {}", index + 1, total, filename::short_title(&item.record.title));

            let file_id = item
                .pmcid
                .map(|id| id.to_string())
                .unwrap_or_else(|| item.log_id.clone());
            let name = article_filename(&file_id, &item.record);

            let status = match item.pmcid {
                Some(pmcid) => {
                    self.downloader
                        .download(pmcid, &request.output_dir.join(&name))
                        .await
                }
                None => DownloadStatus::NoOaLink,
            };

            if status.is_success() {
                info!(status = %status, "Downloaded {name}");
            } else {
                warn!(status = %status, id = %item.log_id, "Download failed");
            }

            run_log.record(item.log_id, item.record.title, name, status);
        }

        let summary = run_log.into_summary(
            &request.query,
            total_found,
            started.elapsed(),
            &absolute_path(&request.output_dir),
        );
        summary.write_to(&request.output_dir).await?;

        Ok(summary)
    }

    async fn prepare_pmc_items(&self, ids: &[String]) -> Vec<WorkItem> {
        let parsed: Vec<(&String, Option<PmcId>)> = ids
            .iter()
            .map(|id| (id, parse_search_id(id, PmcId::parse)))
            .collect();
        let pmcids: Vec<PmcId> = parsed.iter().filter_map(|(_, pmcid)| *pmcid).collect();

        let mut metadata = self.pmc.fetch_metadata(&pmcids).await;

        parsed
            .into_iter()
            .map(|(raw, pmcid)| match pmcid {
                Some(pmcid) => WorkItem {
                    log_id: pmcid.to_string(),
                    pmcid: Some(pmcid),
                    record: metadata
                        .remove(&pmcid)
                        .unwrap_or_else(|| ArticleRecord::placeholder(pmcid.to_string())),
                },
                None => WorkItem::unresolved(raw),
            })
            .collect()
    }

    async fn prepare_pubmed_items(&self, ids: &[String]) -> Vec<WorkItem> {
        let parsed: Vec<(&String, Option<PubMedId>)> = ids
            .iter()
            .map(|id| (id, parse_search_id(id, PubMedId::parse)))
            .collect();
        let pmids: Vec<PubMedId> = parsed.iter().filter_map(|(_, pmid)| *pmid).collect();

        let mapping = self.pubmed.map_to_pmc(&pmids).await;
        let mut metadata = self.pubmed.fetch_pubmed_metadata(&pmids).await;

        parsed
            .into_iter()
            .map(|(raw, pmid)| {
                let Some(pmid) = pmid else {
                    return WorkItem::unresolved(raw);
                };
                let pmcid = mapping.get(&pmid).copied();
                let log_id = pmcid
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| pmid.to_string());
                let mut record = metadata
                    .remove(&pmid)
                    .unwrap_or_else(|| ArticleRecord::placeholder(pmid.to_string()));
                if record.year.is_empty() {
                    record.year = UNKNOWN.to_string();
                }
                WorkItem {
                    log_id,
                    pmcid,
                    record,
                }
            })
            .collect()
    }
}

/// Parse one search hit, logging and discarding identifiers that are malformed
fn parse_search_id<T>(id: &str, parse: impl Fn(&str) -> Result<T>) -> Option<T> {
    match parse(id) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(id = %id, error = %e, "Malformed search result");
            None
        }
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
