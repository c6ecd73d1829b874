use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use crate::common::{ArticleRecord, DownloadLink, PmcId};
use crate::error::{CrawlerError, Result};
use crate::http::HttpSession;
use crate::pmc::oa::parse_oa_response;
use crate::pmc::parser::parse_pmc_articles;

/// Number of PMC IDs per metadata request
pub const PMC_FETCH_BATCH_SIZE: usize = 50;

/// Client for PMC metadata and the Open Access web service
#[derive(Clone)]
pub struct PmcClient {
    session: HttpSession,
}

impl PmcClient {
    pub fn new(session: HttpSession) -> Self {
        Self { session }
    }

    /// Fetch metadata for `pmcids` in batches of [`PMC_FETCH_BATCH_SIZE`]
    ///
    /// Records are matched to identifiers by position within each batch. A
    /// batch is dropped entirely when it fails, or when it returns a different
    /// number of articles than were requested. Identifiers of dropped batches
    /// are absent from the map.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pmc_crawler::{ClientConfig, HttpSession, PmcClient};
    /// use pmc_crawler::common::PmcId;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = PmcClient::new(HttpSession::new(ClientConfig::new())?);
    ///     let ids = vec![PmcId::parse("PMC7906746")?];
    ///     let records = client.fetch_metadata(&ids).await;
    ///     for (id, record) in &records {
    ///         println!("{id}: {}", record.title);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip(self, pmcids), fields(count = pmcids.len()))]
    pub async fn fetch_metadata(&self, pmcids: &[PmcId]) -> HashMap<PmcId, ArticleRecord> {
        let mut records = HashMap::with_capacity(pmcids.len());
        let total_batches = pmcids.len().div_ceil(PMC_FETCH_BATCH_SIZE);

        for (index, batch) in pmcids.chunks(PMC_FETCH_BATCH_SIZE).enumerate() {
            debug!(batch = index + 1, total_batches, size = batch.len(), "Fetching metadata batch");
            match self.fetch_batch(batch).await {
                Ok(parsed) => records.extend(parsed),
                Err(e) => {
                    warn!(batch = index + 1, error = %e, "Skipping metadata batch");
                }
            }
        }

        info!(fetched = records.len(), requested = pmcids.len(), "Metadata fetch complete");
        records
    }

    async fn fetch_batch(&self, batch: &[PmcId]) -> Result<Vec<(PmcId, ArticleRecord)>> {
        let ids = batch
            .iter()
            .map(|id| id.numeric_part().to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = self.session.api_url(
            &format!("{}/efetch.fcgi", self.session.config().effective_base_url()),
            &[
                ("db", "pmc".to_string()),
                ("id", ids),
                ("retmode", "xml".to_string()),
            ],
        );

        let response = self.session.get(&url).await?;
        let xml = response.text().await?;
        let articles = parse_pmc_articles(&xml)?;

        if articles.len() != batch.len() {
            return Err(CrawlerError::BatchCountMismatch {
                requested: batch.len(),
                returned: articles.len(),
            });
        }

        let mut records = Vec::with_capacity(batch.len());
        for (pmcid, meta) in batch.iter().zip(articles) {
            match meta.embedded_id {
                Some(embedded) if embedded != *pmcid => {
                    warn!(
                        pmcid = %pmcid,
                        embedded = %embedded,
                        "Metadata record belongs to a different article, dropping it"
                    );
                }
                _ => records.push((*pmcid, meta.into_record(*pmcid))),
            }
        }

        Ok(records)
    }

    /// Ask the OA service for the download link of one article
    ///
    /// Returns `Ok(None)` when the article has no Open Access package.
    ///
    /// # Errors
    ///
    /// * `CrawlerError::RequestError` / `CrawlerError::ApiError` - If the lookup fails
    /// * `CrawlerError::XmlError` - If the response cannot be parsed
    #[instrument(skip(self), fields(pmcid = %pmcid))]
    pub async fn resolve_download_link(&self, pmcid: PmcId) -> Result<Option<DownloadLink>> {
        let url = self.session.api_url(
            self.session.config().effective_oa_url(),
            &[("id", pmcid.to_string())],
        );

        let response = self.session.get(&url).await?;
        let xml = response.text().await?;
        let link = parse_oa_response(&xml)?;

        match &link {
            Some(link) => debug!(format = %link.format, url = %link.url, "Resolved OA link"),
            None => debug!("No OA link available"),
        }

        Ok(link)
    }
}
