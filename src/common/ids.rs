//! Validated identifiers for PubMed (PMID) and PubMed Central (PMCID)
//!
//! Search results in the PMC database come back as bare numbers; the crawler
//! always works with the prefixed `PMC<n>` form, which is also what appears
//! in output filenames and in the run log.

use crate::error::{CrawlerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated PubMed ID (PMID)
///
/// # Examples
///
/// ```
/// use pmc_crawler::common::PubMedId;
///
/// let pmid = PubMedId::parse("  31978945 ").unwrap();
/// assert_eq!(pmid.as_u32(), 31978945);
/// assert_eq!(pmid.to_string(), "31978945");
///
/// assert!(PubMedId::parse("abc").is_err());
/// assert!(PubMedId::parse("0").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PubMedId {
    value: u32,
}

impl PubMedId {
    /// Parse a PMID from a string, trimming whitespace
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::InvalidPmid` if the input is empty, not a number,
    /// zero, or does not fit in a u32.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || CrawlerError::InvalidPmid {
            pmid: s.to_string(),
        };

        let value = s.trim().parse::<u32>().map_err(|_| invalid())?;
        if value == 0 {
            return Err(invalid());
        }

        Ok(Self { value })
    }

    pub fn as_u32(&self) -> u32 {
        self.value
    }
}

impl fmt::Display for PubMedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for PubMedId {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<PubMedId> for String {
    fn from(id: PubMedId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PubMedId {
    type Error = CrawlerError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

/// A validated PubMed Central ID (PMCID)
///
/// The `PMC` prefix is optional and case-insensitive on input, and always
/// present on output.
///
/// # Examples
///
/// ```
/// use pmc_crawler::common::PmcId;
///
/// let pmcid = PmcId::parse("7906746").unwrap();
/// assert_eq!(pmcid.to_string(), "PMC7906746");
/// assert_eq!(pmcid.numeric_part(), 7906746);
///
/// let pmcid = PmcId::parse("pmc7906746").unwrap();
/// assert_eq!(pmcid.to_string(), "PMC7906746");
///
/// assert!(PmcId::parse("PMC").is_err());
/// assert!(PmcId::parse("PMC0").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PmcId {
    value: u32,
}

impl PmcId {
    /// Parse a PMCID with or without the `PMC` prefix
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::InvalidPmcid` if the numeric part is missing,
    /// not a number, zero, or does not fit in a u32.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || CrawlerError::InvalidPmcid {
            pmcid: s.to_string(),
        };

        let trimmed = s.trim();
        let numeric_part = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("PMC") => &trimmed[3..],
            _ => trimmed,
        };

        let value = numeric_part.parse::<u32>().map_err(|_| invalid())?;
        if value == 0 {
            return Err(invalid());
        }

        Ok(Self { value })
    }

    /// Numeric part without the `PMC` prefix, as used by EFetch on `db=pmc`
    pub fn numeric_part(&self) -> u32 {
        self.value
    }
}

impl fmt::Display for PmcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PMC{}", self.value)
    }
}

impl FromStr for PmcId {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<PmcId> for String {
    fn from(id: PmcId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PmcId {
    type Error = CrawlerError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}
