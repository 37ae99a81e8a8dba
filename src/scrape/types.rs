//! Items and results produced by scrape jobs.

use serde::{Deserialize, Serialize};

/// One listing element extracted from a page. Every field is always present;
/// a field with no match is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedItem {
    /// Random token for client-side list keys. Not a deduplication key.
    pub id: String,
    pub title: String,
    pub link: String,
    pub poster_url: String,
    pub description: String,
    pub rating: String,
    pub year: String,
}

/// An extracted item tagged with its job and page of origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(flatten)]
    pub item: ExtractedItem,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The exact page (seed or paginated) the item came from.
    pub url: String,
}

impl ResultItem {
    pub fn new(item: ExtractedItem, source: &str, kind: Option<&str>, url: &str) -> Self {
        Self {
            item,
            source: source.to_string(),
            kind: kind.map(str::to_string),
            url: url.to_string(),
        }
    }
}

/// Response payload for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub items: Vec<ResultItem>,
    pub count: usize,
    /// Wall-clock seconds.
    pub execution_time: f64,
    /// ISO-8601, UTC.
    pub timestamp: String,
}
