//! PubMed Central: batched metadata, Open Access link lookup and package extraction

pub mod client;
pub mod oa;
pub mod parser;
pub mod tar;

pub use client::{PMC_FETCH_BATCH_SIZE, PmcClient};
pub use oa::parse_oa_response;
pub use parser::{PmcArticleMeta, parse_pmc_articles};
pub use tar::extract_first_pdf;
