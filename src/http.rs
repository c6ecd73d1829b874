//! Shared HTTP session: one reqwest client, one rate limiter, one retry policy
//!
//! All traffic of a crawl (searches, metadata batches, OA lookups and file
//! downloads) goes through a single [`HttpSession`] so connections are reused
//! and every request is paced by the same limiter.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::{fs as tokio_fs, io::AsyncWriteExt};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{CrawlerError, Result};
use crate::rate_limit::RateLimiter;
use crate::retry::with_retry;

/// Downloads at or below this size are treated as failed
pub const MIN_FILE_SIZE: u64 = 1024;

const NCBI_FTP_PREFIX: &str = "ftp://ftp.ncbi.nlm.nih.gov/";
const NCBI_FTP_HTTPS_PREFIX: &str = "https://ftp.ncbi.nlm.nih.gov/";

/// Rewrite NCBI FTP links to the equivalent HTTPS location
///
/// # Example
///
/// ```
/// use pmc_crawler::http::rewrite_ftp_url;
///
/// assert_eq!(
///     rewrite_ftp_url("ftp://ftp.ncbi.nlm.nih.gov/pub/pmc/oa_pdf/ab/cd/x.pdf"),
///     "https://ftp.ncbi.nlm.nih.gov/pub/pmc/oa_pdf/ab/cd/x.pdf"
/// );
/// ```
pub fn rewrite_ftp_url(url: &str) -> String {
    match url.strip_prefix(NCBI_FTP_PREFIX) {
        Some(rest) => format!("{NCBI_FTP_HTTPS_PREFIX}{rest}"),
        None => url.to_string(),
    }
}

/// Build a GET URL from a base and query parameters, percent-encoding values
pub fn build_url(base: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return base.to_string();
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{query}")
}

fn status_error(response: &Response) -> CrawlerError {
    CrawlerError::ApiError {
        status: response.status().as_u16(),
        message: response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

/// Persistent HTTP session shared by every client of a crawl
#[derive(Clone)]
pub struct HttpSession {
    client: Client,
    rate_limiter: RateLimiter,
    config: ClientConfig,
}

impl HttpSession {
    /// Create a session from configuration
    ///
    /// # Errors
    ///
    /// * `CrawlerError::RequestError` - If the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.effective_user_agent())
            .build()?;

        Ok(Self {
            client,
            rate_limiter: config.create_rate_limiter(),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Build an API URL carrying `params` plus the configured API parameters
    pub fn api_url(&self, base: &str, params: &[(&str, String)]) -> String {
        let mut all_params: Vec<(String, String)> = params
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        all_params.extend(self.config.build_api_params());
        build_url(base, &all_params)
    }

    /// GET an API URL with pacing, retry and status checking
    ///
    /// Any non-success status becomes `ApiError`; [`RetryableError`] decides
    /// which of those are attempted again.
    ///
    /// # Errors
    ///
    /// * `CrawlerError::RequestError` - If the request fails after all retries
    /// * `CrawlerError::ApiError` - If the server answers with a non-success status
    ///
    /// [`RetryableError`]: crate::retry::RetryableError
    pub async fn get(&self, url: &str) -> Result<Response> {
        with_retry(
            || self.paced_get(url, self.config.timeout),
            &self.config.retry_config,
            "NCBI API request",
        )
        .await
    }

    /// One paced attempt; the body is left unread
    async fn paced_get(&self, url: &str, timeout: Duration) -> Result<Response> {
        self.rate_limiter.acquire().await;
        debug!(url, "GET");

        let response = self.client.get(url).timeout(timeout).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response),
            _ => Err(status_error(&response)),
        }
    }

    /// Download `url` to `dest`, returning the number of bytes written
    ///
    /// NCBI FTP links are fetched over HTTPS. A download that ends at or below
    /// [`MIN_FILE_SIZE`] bytes, or that fails part way, leaves no file behind.
    ///
    /// # Errors
    ///
    /// * `CrawlerError::FileTooSmall` - If the body is not larger than `MIN_FILE_SIZE`
    /// * `CrawlerError::RequestError` / `CrawlerError::ApiError` - If the transfer fails
    /// * `CrawlerError::IoError` - If the destination cannot be written
    pub async fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64> {
        let url = rewrite_ftp_url(url);

        let result = with_retry(
            || self.fetch_to_file(&url, dest),
            &self.config.retry_config,
            "file download",
        )
        .await;

        match result {
            Ok(size) if size > MIN_FILE_SIZE => {
                debug!(url = %url, size, "Download complete");
                Ok(size)
            }
            Ok(size) => {
                remove_partial(dest).await;
                Err(CrawlerError::FileTooSmall {
                    size,
                    minimum: MIN_FILE_SIZE,
                })
            }
            Err(e) => {
                remove_partial(dest).await;
                Err(e)
            }
        }
    }

    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self.paced_get(url, self.config.download_timeout).await?;

        let mut file = tokio_fs::File::create(dest)
            .await
            .map_err(|e| CrawlerError::io("Failed to create file", e))?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| CrawlerError::io("Failed to write file", e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| CrawlerError::io("Failed to flush file", e))?;

        Ok(written)
    }
}

async fn remove_partial(path: &Path) {
    if tokio_fs::try_exists(path).await.unwrap_or(false) {
        if let Err(e) = tokio_fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Could not remove incomplete download");
        }
    }
}
