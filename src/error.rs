use std::result;

use crate::retry::RetryableError;
use thiserror::Error;

/// Error types for crawler operations
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// XML parsing failed
    #[error("XML parsing failed: {0}")]
    XmlError(String),

    /// Generic API error with HTTP status code
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// IO error for file operations
    #[error("IO error: {message}")]
    IoError { message: String },

    /// Invalid PMID format
    #[error("Invalid PMID format: {pmid}")]
    InvalidPmid { pmid: String },

    /// Invalid PMC ID format
    #[error("Invalid PMC ID format: {pmcid}")]
    InvalidPmcid { pmcid: String },

    /// Publication date filter could not be parsed
    #[error("Invalid date '{value}': expected YYYY/MM/DD")]
    InvalidDate { value: String },

    /// The OA service reported an error or had no usable record
    #[error("No Open Access download link for {pmcid}")]
    OaNotAvailable { pmcid: String },

    /// Archive could not be read or held no matching entry
    #[error("Archive error: {message}")]
    ArchiveError { message: String },

    /// Downloaded file did not reach the minimum size
    #[error("Downloaded file too small: {size} bytes (minimum {minimum})")]
    FileTooSmall { size: u64, minimum: u64 },

    /// Metadata response did not line up with the requested identifiers
    #[error("Metadata batch returned {returned} records for {requested} identifiers")]
    BatchCountMismatch { requested: usize, returned: usize },

    /// Search produced no identifiers
    #[error("No search results for query '{query}'")]
    NoSearchResults { query: String },
}

pub type Result<T> = result::Result<T, CrawlerError>;

impl CrawlerError {
    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        CrawlerError::IoError {
            message: format!("{context}: {err}"),
        }
    }
}

impl RetryableError for CrawlerError {
    fn is_retryable(&self) -> bool {
        match self {
            CrawlerError::RequestError(err) => {
                if err.is_timeout() || err.is_connect() {
                    return true;
                }

                // Check for server errors (5xx)
                if let Some(status) = err.status() {
                    return status.is_server_error() || status.as_u16() == 429;
                }

                // DNS, reset connections and truncated bodies
                !err.is_builder() && !err.is_redirect() && !err.is_decode()
            }

            CrawlerError::ApiError { status, .. } => {
                (*status >= 500 && *status < 600) || *status == 429
            }

            CrawlerError::JsonError(_)
            | CrawlerError::XmlError(_)
            | CrawlerError::IoError { .. }
            | CrawlerError::InvalidPmid { .. }
            | CrawlerError::InvalidPmcid { .. }
            | CrawlerError::InvalidDate { .. }
            | CrawlerError::OaNotAvailable { .. }
            | CrawlerError::ArchiveError { .. }
            | CrawlerError::FileTooSmall { .. }
            | CrawlerError::BatchCountMismatch { .. }
            | CrawlerError::NoSearchResults { .. } => false,
        }
    }

    fn retry_reason(&self) -> &str {
        if self.is_retryable() {
            match self {
                CrawlerError::RequestError(err) if err.is_timeout() => "Request timeout",
                CrawlerError::RequestError(err) if err.is_connect() => "Connection error",
                CrawlerError::RequestError(_) => "Network error",
                CrawlerError::ApiError { status, .. } => match status {
                    429 => "Rate limit exceeded",
                    _ => "Server error",
                },
                _ => "Transient error",
            }
        } else {
            match self {
                CrawlerError::JsonError(_) => "Invalid JSON response",
                CrawlerError::XmlError(_) => "Invalid XML response",
                CrawlerError::InvalidPmid { .. }
                | CrawlerError::InvalidPmcid { .. }
                | CrawlerError::InvalidDate { .. } => "Invalid input",
                CrawlerError::IoError { .. } => "File system error",
                CrawlerError::FileTooSmall { .. } => "Incomplete download",
                CrawlerError::ApiError { .. } => "Client error",
                _ => "Non-transient error",
            }
        }
    }
}
