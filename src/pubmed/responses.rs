//! JSON bodies returned by ESearch and ELink (`retmode=json`)

use serde::Deserialize;

/// `{"esearchresult": {...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct SearchEnvelope {
    #[serde(rename = "esearchresult")]
    pub result: SearchBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchBody {
    /// Set instead of a result list when NCBI rejects the query
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
    /// Total hit count, sent as a string
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default, rename = "idlist")]
    pub ids: Vec<String>,
    #[serde(default, rename = "querytranslation")]
    pub query_translation: Option<String>,
}

/// One linkset per PMID sent
#[derive(Debug, Deserialize)]
pub(crate) struct LinkEnvelope {
    #[serde(default)]
    pub linksets: Vec<LinkSet>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkSet {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default, rename = "linksetdbs")]
    pub targets: Vec<LinkTarget>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkTarget {
    #[serde(rename = "dbto")]
    pub db: String,
    #[serde(default)]
    pub links: Vec<String>,
}
