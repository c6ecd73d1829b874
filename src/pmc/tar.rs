//! PDF extraction from PMC Open Access `.tar.gz` packages

use std::fs::{self, File};
use std::io;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tokio::task;
use tracing::{debug, instrument, warn};

use crate::error::{CrawlerError, Result};

/// Extract the first `.pdf` entry (case-insensitive) of `archive` to `dest`
///
/// Entries are scanned in archive order and only the first match is written.
/// On failure `dest` does not exist afterwards.
///
/// # Errors
///
/// * `CrawlerError::ArchiveError` - If the archive cannot be read or has no PDF entry
/// * `CrawlerError::IoError` - If `dest` cannot be written
#[instrument(skip_all, fields(archive = %archive.display(), dest = %dest.display()))]
pub async fn extract_first_pdf(archive: &Path, dest: &Path) -> Result<()> {
    let archive_path = archive.to_path_buf();
    let dest_path = dest.to_path_buf();

    let result = task::spawn_blocking(move || extract_first_pdf_blocking(&archive_path, &dest_path))
        .await
        .map_err(|e| CrawlerError::ArchiveError {
            message: format!("Extraction task failed: {e}"),
        })?;

    if result.is_err() && dest.exists() {
        if let Err(e) = fs::remove_file(dest) {
            warn!(error = %e, "Could not remove partially extracted PDF");
        }
    }

    result
}

fn archive_error(context: &str, err: io::Error) -> CrawlerError {
    CrawlerError::ArchiveError {
        message: format!("{context}: {err}"),
    }
}

fn extract_first_pdf_blocking(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).map_err(|e| archive_error("Failed to open archive", e))?;
    let mut archive_reader = Archive::new(GzDecoder::new(file));

    let entries = archive_reader
        .entries()
        .map_err(|e| archive_error("Failed to read archive entries", e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| archive_error("Failed to read archive entry", e))?;
        let name = entry
            .path()
            .map_err(|e| archive_error("Failed to read entry path", e))?
            .to_string_lossy()
            .into_owned();

        if !entry.header().entry_type().is_file() || !name.to_lowercase().ends_with(".pdf") {
            continue;
        }

        debug!(entry = %name, "Extracting PDF entry");
        let mut out = File::create(dest).map_err(|e| CrawlerError::io("Failed to create PDF file", e))?;
        io::copy(&mut entry, &mut out).map_err(|e| archive_error("Failed to extract PDF entry", e))?;
        return Ok(());
    }

    Err(CrawlerError::ArchiveError {
        message: "No PDF entry in archive".to_string(),
    })
}
