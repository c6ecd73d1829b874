//! PMC Open Access web service response parsing
//!
//! A successful lookup looks like:
//!
//! ```xml
//! <OA>
//!   <responseDate>2024-01-01 00:00:00</responseDate>
//!   <request id="PMC7906746">...</request>
//!   <records returned-count="1" total-count="1">
//!     <record id="PMC7906746" citation="..." license="CC BY" retracted="no">
//!       <link format="tgz" updated="..." href="ftp://ftp.ncbi.nlm.nih.gov/pub/pmc/oa_package/f1/69/PMC7906746.tar.gz"/>
//!       <link format="pdf" updated="..." href="ftp://ftp.ncbi.nlm.nih.gov/pub/pmc/oa_pdf/f1/69/main.PMC7906746.pdf"/>
//!     </record>
//!   </records>
//! </OA>
//! ```
//!
//! Articles outside the Open Access subset get `<error code="idIsNotOpenAccess">`.

use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{DownloadLink, LinkFormat};
use crate::error::{CrawlerError, Result};

#[derive(Debug, Deserialize, Serialize)]
struct OaResponse {
    #[serde(rename = "responseDate")]
    response_date: Option<String>,
    records: Option<OaRecords>,
    error: Option<OaError>,
}

#[derive(Debug, Deserialize, Serialize)]
struct OaRecords {
    #[serde(rename = "@returned-count")]
    returned_count: Option<String>,
    #[serde(default)]
    record: Vec<OaRecord>,
}

#[derive(Debug, Deserialize, Serialize)]
struct OaRecord {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@license")]
    license: Option<String>,
    #[serde(default)]
    link: Vec<OaLink>,
}

#[derive(Debug, Deserialize, Serialize)]
struct OaLink {
    #[serde(rename = "@format")]
    format: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct OaError {
    #[serde(rename = "@code")]
    code: Option<String>,
    #[serde(rename = "$text")]
    message: Option<String>,
}

/// Pick the download link from an OA service response
///
/// Returns `Ok(None)` when the service reports an error or the record has no
/// usable link. A `pdf` link wins over a `tgz` link; if neither is offered
/// the first remaining link is returned as [`LinkFormat::Other`].
///
/// # Errors
///
/// * `CrawlerError::XmlError` - If the body is not an OA response document
///
/// # Example
///
/// ```
/// use pmc_crawler::common::LinkFormat;
/// use pmc_crawler::pmc::oa::parse_oa_response;
///
/// let xml = r#"<OA><records><record id="PMC1">
///     <link format="tgz" href="https://host/PMC1.tar.gz"/>
///     <link format="pdf" href="https://host/PMC1.pdf"/>
/// </record></records></OA>"#;
///
/// let link = parse_oa_response(xml).unwrap().unwrap();
/// assert_eq!(link.format, LinkFormat::Pdf);
/// assert_eq!(link.url, "https://host/PMC1.pdf");
/// ```
pub fn parse_oa_response(xml: &str) -> Result<Option<DownloadLink>> {
    let response: OaResponse = from_str(xml)
        .map_err(|e| CrawlerError::XmlError(format!("Failed to deserialize OA response: {e}")))?;

    if let Some(error) = &response.error {
        debug!(
            code = error.code.as_deref().unwrap_or(""),
            message = error.message.as_deref().unwrap_or(""),
            "OA service returned an error"
        );
        return Ok(None);
    }

    let links: Vec<(String, String)> = response
        .records
        .into_iter()
        .flat_map(|records| records.record)
        .flat_map(|record| record.link)
        .filter_map(|link| match (link.format, link.href) {
            (Some(format), Some(href)) if !href.is_empty() => Some((format, href)),
            _ => None,
        })
        .collect();

    let find = |wanted: &str| {
        links
            .iter()
            .find(|(format, _)| format.eq_ignore_ascii_case(wanted))
            .map(|(_, href)| href.clone())
    };

    if let Some(href) = find("pdf") {
        return Ok(Some(DownloadLink::new(href, LinkFormat::Pdf)));
    }
    if let Some(href) = find("tgz") {
        return Ok(Some(DownloadLink::new(href, LinkFormat::Archive)));
    }

    Ok(links
        .into_iter()
        .next()
        .map(|(format, href)| DownloadLink::new(href, LinkFormat::from_oa_format(&format))))
}
