//! Error taxonomy for scrape jobs.

use std::time::Duration;

use thiserror::Error;

use crate::browser::BrowserError;

/// Errors raised while running a scrape job.
///
/// `Navigation` and `Extraction` are per-page failures: the engine logs them
/// and moves on. The other variants end the job.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The job was malformed; no browser was launched.
    #[error("invalid job: {0}")]
    Validation(String),

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("extraction from {url} failed: {reason}")]
    Extraction { url: String, reason: String },

    /// No session slot became free within the queue timeout.
    #[error("too many concurrent jobs (waited {}s for a browser slot)", .waited.as_secs())]
    Busy { waited: Duration },

    #[error("browser session failed: {0}")]
    Orchestration(#[source] BrowserError),
}

impl ScrapeError {
    /// Whether the failure is confined to a single page.
    pub fn is_page_level(&self) -> bool {
        matches!(self, Self::Navigation { .. } | Self::Extraction { .. })
    }

    /// Render the error and its causes, one per line.
    pub fn chain(&self) -> String {
        let mut lines = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            lines.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        lines.join("\n")
    }
}
