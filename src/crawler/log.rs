//! Run log written to `crawl_log.json` at the end of a crawl

use std::path::Path;
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crawler::download::DownloadStatus;
use crate::error::{CrawlerError, Result};

/// Name of the run log inside the output directory
pub const LOG_FILE_NAME: &str = "crawl_log.json";

/// Outcome of one processed article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// PMC ID of the article, or its PMID when no PMC ID could be found
    pub pmc_id: String,
    pub title: String,
    /// Output filename, present only for successful downloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub status: DownloadStatus,
}

/// Ordered list of per-article outcomes
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    records: Vec<ResultRecord>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the outcome of one article; the filename is kept only on success
    pub fn record(
        &mut self,
        pmc_id: impl Into<String>,
        title: impl Into<String>,
        filename: impl Into<String>,
        status: DownloadStatus,
    ) {
        self.records.push(ResultRecord {
            pmc_id: pmc_id.into(),
            title: title.into(),
            filename: status.is_success().then(|| filename.into()),
            status,
        });
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.status.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    /// Close the log into a run summary
    pub fn into_summary(
        self,
        query: &str,
        total_found: usize,
        elapsed: Duration,
        output_directory: &Path,
    ) -> CrawlSummary {
        CrawlSummary {
            query: query.to_string(),
            total_found,
            downloaded: self.succeeded(),
            failed: self.failed(),
            elapsed_time: format!("{:.1}s", elapsed.as_secs_f64()),
            output_directory: output_directory.display().to_string(),
            timestamp: Local::now().to_rfc3339(),
            details: self.records,
        }
    }
}

/// Summary of a complete run, as stored in [`LOG_FILE_NAME`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub query: String,
    pub total_found: usize,
    pub downloaded: usize,
    pub failed: usize,
    /// Wall-clock time, e.g. `"12.3s"`
    pub elapsed_time: String,
    /// Absolute path of the output directory
    pub output_directory: String,
    pub timestamp: String,
    pub details: Vec<ResultRecord>,
}

impl CrawlSummary {
    /// Write the summary as pretty JSON to `dir/crawl_log.json`, replacing any previous log
    ///
    /// # Errors
    ///
    /// * `CrawlerError::JsonError` - If serialization fails
    /// * `CrawlerError::IoError` - If the file cannot be written
    pub async fn write_to(&self, dir: &Path) -> Result<()> {
        let path = dir.join(LOG_FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| CrawlerError::io("Failed to write run log", e))?;
        debug!(path = %path.display(), "Run log written");
        Ok(())
    }
}
