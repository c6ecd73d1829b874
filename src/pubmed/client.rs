use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use crate::common::{ArticleRecord, PmcId, PubMedId};
use crate::error::{CrawlerError, Result};
use crate::http::HttpSession;
use crate::pubmed::models::SearchResult;
use crate::pubmed::parser::parse_pubmed_articles;
use crate::pubmed::query::{DateRange, SearchDb};
use crate::pubmed::responses::{LinkEnvelope, SearchEnvelope};

/// Number of PMIDs per PubMed EFetch request
pub const PUBMED_FETCH_BATCH_SIZE: usize = 100;

/// Number of PMIDs per ELink request
pub const ELINK_BATCH_SIZE: usize = 200;

/// Client for the E-utilities search, fetch and link endpoints
#[derive(Clone)]
pub struct PubMedClient {
    session: HttpSession,
}

impl PubMedClient {
    /// Create a client on top of a shared session
    pub fn new(session: HttpSession) -> Self {
        Self { session }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.session.config().effective_base_url(), name)
    }

    /// Search `db` for `query`, returning at most `max_results` identifiers
    ///
    /// When `date_range` is given the search is restricted on publication date.
    /// Identifiers are returned exactly as ESearch lists them (bare numbers for
    /// both databases).
    ///
    /// # Errors
    ///
    /// * `CrawlerError::RequestError` / `CrawlerError::ApiError` - If the request fails
    /// * `CrawlerError::JsonError` - If the response is not valid ESearch JSON
    /// * `CrawlerError::ApiError` - If ESearch reports an error in its body
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pmc_crawler::{ClientConfig, HttpSession, PubMedClient, SearchDb};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let session = HttpSession::new(ClientConfig::new())?;
    ///     let client = PubMedClient::new(session);
    ///     let result = client.search("CRISPR", SearchDb::Pmc, 10, None).await?;
    ///     println!("{} of {} hits", result.ids.len(), result.total_count);
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip(self, date_range), fields(query = %query, db = %db, max_results))]
    pub async fn search(
        &self,
        query: &str,
        db: SearchDb,
        max_results: usize,
        date_range: Option<&DateRange>,
    ) -> Result<SearchResult> {
        let mut params = vec![
            ("db", db.as_api_param().to_string()),
            ("term", query.to_string()),
            ("retmax", max_results.to_string()),
            ("retmode", "json".to_string()),
            ("usehistory", "y".to_string()),
        ];
        if let Some(range) = date_range {
            params.push(("datetype", "pdat".to_string()));
            params.push(("mindate", range.mindate()));
            params.push(("maxdate", range.maxdate()));
        }

        let url = self.session.api_url(&self.endpoint("esearch.fcgi"), &params);
        debug!("Making ESearch API request");
        let response = self.session.get(&url).await?;
        let text = response.text().await?;
        let envelope: SearchEnvelope = serde_json::from_str(&text)?;
        let data = envelope.result;

        if let Some(message) = data.error {
            warn!(error = %message, "ESearch reported an error");
            return Err(CrawlerError::ApiError {
                status: 200,
                message,
            });
        }

        let total_count = data
            .count
            .as_deref()
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(data.ids.len());

        info!(
            total_count,
            fetched = data.ids.len(),
            "Search completed successfully"
        );

        Ok(SearchResult {
            total_count,
            ids: data.ids,
            query_translation: data.query_translation,
        })
    }

    /// Fetch PubMed metadata for `pmids` in batches of [`PUBMED_FETCH_BATCH_SIZE`]
    ///
    /// A batch that fails to download or parse is skipped with a warning, so
    /// its identifiers are absent from the returned map.
    #[instrument(skip(self, pmids), fields(count = pmids.len()))]
    pub async fn fetch_pubmed_metadata(
        &self,
        pmids: &[PubMedId],
    ) -> HashMap<PubMedId, ArticleRecord> {
        let mut records = HashMap::with_capacity(pmids.len());

        for (index, batch) in pmids.chunks(PUBMED_FETCH_BATCH_SIZE).enumerate() {
            match self.fetch_pubmed_batch(batch).await {
                Ok(parsed) => {
                    debug!(batch = index + 1, parsed = parsed.len(), "Fetched PubMed metadata batch");
                    for (pmid, record) in parsed {
                        if batch.contains(&pmid) {
                            records.insert(pmid, record);
                        } else {
                            warn!(pmid = %pmid, "Ignoring PubMed record that was not requested");
                        }
                    }
                }
                Err(e) => {
                    warn!(batch = index + 1, error = %e, "Failed to fetch PubMed metadata batch");
                }
            }
        }

        records
    }

    async fn fetch_pubmed_batch(&self, batch: &[PubMedId]) -> Result<Vec<(PubMedId, ArticleRecord)>> {
        let ids = join_ids(batch.iter().map(|id| id.to_string()));
        let url = self.session.api_url(
            &self.endpoint("efetch.fcgi"),
            &[
                ("db", "pubmed".to_string()),
                ("id", ids),
                ("retmode", "xml".to_string()),
            ],
        );

        let response = self.session.get(&url).await?;
        let xml = response.text().await?;
        parse_pubmed_articles(&xml)
    }

    /// Map PMIDs to PMC IDs with ELink, in batches of [`ELINK_BATCH_SIZE`]
    ///
    /// PMIDs without a PMC counterpart, and those in failed batches, are
    /// absent from the returned map.
    #[instrument(skip(self, pmids), fields(count = pmids.len()))]
    pub async fn map_to_pmc(&self, pmids: &[PubMedId]) -> HashMap<PubMedId, PmcId> {
        let mut mapping = HashMap::new();

        for (index, batch) in pmids.chunks(ELINK_BATCH_SIZE).enumerate() {
            match self.elink_batch(batch).await {
                Ok(pairs) => mapping.extend(pairs),
                Err(e) => {
                    warn!(batch = index + 1, error = %e, "Failed to map PMIDs to PMC IDs");
                }
            }
        }

        info!(mapped = mapping.len(), requested = pmids.len(), "PMID to PMCID mapping complete");
        mapping
    }

    async fn elink_batch(&self, batch: &[PubMedId]) -> Result<Vec<(PubMedId, PmcId)>> {
        // ELink answers with one linkset per repeated `id` parameter
        let mut params = vec![
            ("dbfrom", "pubmed".to_string()),
            ("db", "pmc".to_string()),
            ("retmode", "json".to_string()),
        ];
        params.extend(batch.iter().map(|id| ("id", id.to_string())));

        let url = self.session.api_url(&self.endpoint("elink.fcgi"), &params);
        let response = self.session.get(&url).await?;
        let text = response.text().await?;
        let elink: LinkEnvelope = serde_json::from_str(&text)?;

        let mut pairs = Vec::new();
        for linkset in elink.linksets {
            let Some(pmid) = linkset.ids.first().and_then(|id| PubMedId::parse(id).ok()) else {
                continue;
            };

            let pmc = linkset
                .targets
                .iter()
                .find(|target| target.db == "pmc")
                .and_then(|target| target.links.first())
                .and_then(|link| PmcId::parse(link).ok());

            if let Some(pmcid) = pmc {
                pairs.push((pmid, pmcid));
            }
        }

        Ok(pairs)
    }
}

fn join_ids(ids: impl Iterator<Item = String>) -> String {
    ids.collect::<Vec<_>>().join(",")
}
