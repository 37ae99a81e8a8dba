//! Scrape job descriptions and validation.

use serde::{Deserialize, Serialize};

use super::error::ScrapeError;

/// Optional CSS selector hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    /// Selector that must appear before the page counts as loaded.
    #[serde(default)]
    pub wait: Option<String>,
    /// Container selector for repeating listing elements.
    #[serde(default)]
    pub main: Option<String>,
}

/// How to derive follow-up page URLs from a seed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationRule {
    /// Presence flag; pagination is ignored when empty.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Total pages per seed, the seed included.
    pub max: u32,
    /// Added to the trailing page number for each following page.
    #[serde(default)]
    pub offset_multiplier: Option<i64>,
}

impl PaginationRule {
    /// Page-number step. Missing or zero means 1.
    pub fn offset(&self) -> i64 {
        self.offset_multiplier.filter(|&n| n != 0).unwrap_or(1)
    }

    /// Whether the rule asks for any page beyond the seed.
    pub fn is_active(&self) -> bool {
        self.max > 1 && self.pattern.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// A job as submitted by a caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub selectors: Option<Selectors>,
    #[serde(default)]
    pub pagination: Option<PaginationRule>,
    #[serde(default)]
    pub min_items: Option<u64>,
}

/// Message returned for jobs missing a source or seed URLs.
pub const VALIDATION_DETAILS: &str = "source and urls (non-empty array) are required";

impl JobRequest {
    /// Check required fields and produce an immutable [`Job`].
    pub fn validate(self) -> Result<Job, ScrapeError> {
        let source = self
            .source
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ScrapeError::Validation(VALIDATION_DETAILS.to_string()))?;
        let urls = self
            .urls
            .filter(|urls| !urls.is_empty())
            .ok_or_else(|| ScrapeError::Validation(VALIDATION_DETAILS.to_string()))?;

        Ok(Job {
            source,
            kind: self.kind,
            urls,
            selectors: self.selectors.unwrap_or_default(),
            pagination: self.pagination,
            // Zero means no threshold
            min_items: self.min_items.filter(|&n| n > 0).map(|n| n as usize),
        })
    }
}

/// A validated job. Owned by the engine for the life of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub source: String,
    pub kind: Option<String>,
    pub urls: Vec<String>,
    pub selectors: Selectors,
    pub pagination: Option<PaginationRule>,
    pub min_items: Option<usize>,
}

impl Job {
    pub fn wait_selector(&self) -> Option<&str> {
        self.selectors.wait.as_deref()
    }

    pub fn container_selector(&self) -> Option<&str> {
        self.selectors.main.as_deref()
    }

    /// The pagination rule, if it asks for more than the seed page.
    pub fn active_pagination(&self) -> Option<&PaginationRule> {
        self.pagination.as_ref().filter(|rule| rule.is_active())
    }
}
