//! Search parameters for ESearch: target database and publication date window

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CrawlerError, Result};

/// NCBI database searched by ESearch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDb {
    /// PubMed Central full-text archive; hits are PMC identifiers
    #[default]
    Pmc,
    /// PubMed citation index; hits are PMIDs that must be mapped to PMC
    PubMed,
}

impl SearchDb {
    pub fn as_api_param(&self) -> &'static str {
        match self {
            SearchDb::Pmc => "pmc",
            SearchDb::PubMed => "pubmed",
        }
    }
}

impl fmt::Display for SearchDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_param())
    }
}

impl FromStr for SearchDb {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pmc" => Ok(SearchDb::Pmc),
            "pubmed" => Ok(SearchDb::PubMed),
            other => Err(format!("unknown database '{other}' (expected pmc or pubmed)")),
        }
    }
}

const DATE_FORMAT: &str = "%Y/%m/%d";

/// Inclusive publication date window (`datetype=pdat`)
///
/// # Example
///
/// ```
/// use pmc_crawler::pubmed::DateRange;
///
/// let range = DateRange::parse("2023/01/01", "2024/01/01").unwrap();
/// assert_eq!(range.mindate(), "2023/01/01");
/// assert_eq!(range.maxdate(), "2024/01/01");
///
/// assert!(DateRange::parse("2023-01-01", "2024/01/01").is_err());
/// assert!(DateRange::parse("2024/01/01", "2023/01/01").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Parse both ends in `YYYY/MM/DD` form
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::InvalidDate` if either date is malformed or the
    /// start lies after the end.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;

        if start_date > end_date {
            return Err(CrawlerError::InvalidDate {
                value: format!("{start} is after {end}"),
            });
        }

        Ok(Self {
            start: start_date,
            end: end_date,
        })
    }

    /// Build a range only when both ends are given
    pub fn from_optional(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>> {
        match (start, end) {
            (Some(start), Some(end)) => Self::parse(start, end).map(Some),
            _ => Ok(None),
        }
    }

    pub fn mindate(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn maxdate(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| CrawlerError::InvalidDate {
        value: value.to_string(),
    })
}
