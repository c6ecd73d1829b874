use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for metadata fields the API did not provide
pub const UNKNOWN: &str = "Unknown";

/// Bibliographic metadata for one article
///
/// Built once from a parsed metadata response and never modified afterwards.
/// Missing title and journal hold [`UNKNOWN`]. A missing year is an empty
/// string for PMC metadata and [`UNKNOWN`] for PubMed metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Identifier the record was requested under (`PMC123` or a PMID)
    pub id: String,
    pub title: String,
    /// Author names in document order, formatted "Given Surname"
    pub authors: Vec<String>,
    pub journal: String,
    pub year: String,
    pub doi: Option<String>,
}

impl ArticleRecord {
    /// A record carrying only placeholders, used when metadata is missing
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: UNKNOWN.to_string(),
            authors: Vec::new(),
            journal: UNKNOWN.to_string(),
            year: String::new(),
            doi: None,
        }
    }
}

/// Format of an Open Access download link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkFormat {
    /// Direct PDF file
    Pdf,
    /// Gzipped tar package containing the article files
    Archive,
    /// Any other format the OA service advertises
    Other(String),
}

impl LinkFormat {
    /// Map the `format` attribute of an OA `<link>` element
    pub fn from_oa_format(format: &str) -> Self {
        match format {
            "pdf" => LinkFormat::Pdf,
            "tgz" => LinkFormat::Archive,
            other => LinkFormat::Other(other.to_string()),
        }
    }
}

impl fmt::Display for LinkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkFormat::Pdf => write!(f, "pdf"),
            LinkFormat::Archive => write!(f, "tgz"),
            LinkFormat::Other(format) => write!(f, "{format}"),
        }
    }
}

/// A resolved download location for one article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub format: LinkFormat,
}

impl DownloadLink {
    pub fn new(url: impl Into<String>, format: LinkFormat) -> Self {
        Self {
            url: url.into(),
            format,
        }
    }
}
