//! E-utilities client: search, PubMed metadata and PMID to PMCID mapping

pub mod client;
pub mod models;
pub mod parser;
pub mod query;
pub(crate) mod responses;

pub use client::{ELINK_BATCH_SIZE, PUBMED_FETCH_BATCH_SIZE, PubMedClient};
pub use models::SearchResult;
pub use parser::parse_pubmed_articles;
pub use query::{DateRange, SearchDb};
