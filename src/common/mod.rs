//! Identifier types and records shared by the PubMed and PMC clients

pub mod ids;
pub mod models;
pub mod xml;

pub use ids::{PmcId, PubMedId};
pub use models::{ArticleRecord, DownloadLink, LinkFormat, UNKNOWN};
