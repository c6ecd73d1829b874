use serde::{Deserialize, Serialize};

/// Identifiers returned by one ESearch call
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total number of matches reported by NCBI (may exceed `ids.len()`)
    pub total_count: usize,
    /// Identifiers in relevance order, as returned by ESearch
    pub ids: Vec<String>,
    pub query_translation: Option<String>,
}
