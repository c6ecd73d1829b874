use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::fs as tokio_fs;
use tracing::{debug, instrument, warn};

use crate::common::{LinkFormat, PmcId};
use crate::http::HttpSession;
use crate::pmc::{PmcClient, extract_first_pdf};

/// Terminal outcome of one article download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// The output file was already on disk; nothing was fetched
    AlreadyExists,
    DirectPdf,
    ExtractedFromTgz,
    /// The OA service had no package for the article, or could not be reached
    NoOaLink,
    DownloadFailed,
    TgzDownloadFailed,
    PdfExtractionFailed,
    /// The OA service only offered a format other than pdf or tgz
    UnknownFormat,
}

impl DownloadStatus {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DownloadStatus::AlreadyExists
                | DownloadStatus::DirectPdf
                | DownloadStatus::ExtractedFromTgz
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::AlreadyExists => "already_exists",
            DownloadStatus::DirectPdf => "direct_pdf",
            DownloadStatus::ExtractedFromTgz => "extracted_from_tgz",
            DownloadStatus::NoOaLink => "no_oa_link",
            DownloadStatus::DownloadFailed => "download_failed",
            DownloadStatus::TgzDownloadFailed => "tgz_download_failed",
            DownloadStatus::PdfExtractionFailed => "pdf_extraction_failed",
            DownloadStatus::UnknownFormat => "unknown_format",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downloads the PDF of one article at a time
///
/// For each article: skip if the destination exists, resolve the OA link,
/// then either fetch the PDF directly or fetch the package into a temporary
/// directory and extract its first PDF. Every failure maps to a
/// [`DownloadStatus`]; nothing here aborts a crawl.
#[derive(Clone)]
pub struct ArticleDownloader {
    session: HttpSession,
    pmc: PmcClient,
}

impl ArticleDownloader {
    pub fn new(session: HttpSession) -> Self {
        Self {
            pmc: PmcClient::new(session.clone()),
            session,
        }
    }

    /// Download `pmcid` to `dest`
    #[instrument(skip(self, dest), fields(pmcid = %pmcid, dest = %dest.display()))]
    pub async fn download(&self, pmcid: PmcId, dest: &Path) -> DownloadStatus {
        if tokio_fs::try_exists(dest).await.unwrap_or(false) {
            debug!("Output file already exists");
            return DownloadStatus::AlreadyExists;
        }

        let link = match self.pmc.resolve_download_link(pmcid).await {
            Ok(Some(link)) => link,
            Ok(None) => return DownloadStatus::NoOaLink,
            Err(e) => {
                warn!(error = %e, "OA lookup failed");
                return DownloadStatus::NoOaLink;
            }
        };

        match link.format {
            LinkFormat::Pdf => match self.session.download_to_file(&link.url, dest).await {
                Ok(_) => DownloadStatus::DirectPdf,
                Err(e) => {
                    warn!(url = %link.url, error = %e, "PDF download failed");
                    DownloadStatus::DownloadFailed
                }
            },
            LinkFormat::Archive => self.download_from_archive(pmcid, &link.url, dest).await,
            LinkFormat::Other(format) => {
                debug!(format = %format, "Unsupported OA link format");
                DownloadStatus::UnknownFormat
            }
        }
    }

    async fn download_from_archive(&self, pmcid: PmcId, url: &str, dest: &Path) -> DownloadStatus {
        // Removed on drop, whatever the outcome
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "Could not create temporary directory");
                return DownloadStatus::TgzDownloadFailed;
            }
        };
        let archive_path = temp_dir.path().join(format!("{pmcid}.tar.gz"));

        if let Err(e) = self.session.download_to_file(url, &archive_path).await {
            warn!(url = %url, error = %e, "Package download failed");
            return DownloadStatus::TgzDownloadFailed;
        }

        match extract_first_pdf(&archive_path, dest).await {
            Ok(()) => DownloadStatus::ExtractedFromTgz,
            Err(e) => {
                warn!(error = %e, "PDF extraction failed");
                DownloadStatus::PdfExtractionFailed
            }
        }
    }
}
