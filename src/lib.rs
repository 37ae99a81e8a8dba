//! Scrape relay - drives a headless browser to extract listing data.
//!
//! Callers submit a job (source identifier, seed URLs, optional selector
//! hints, pagination rule, minimum item count). The relay renders each page
//! in a real browser so client-side anti-bot checks pass, scrolls to trigger
//! lazy loading, and extracts titles, links, posters, descriptions, ratings
//! and years from the rendered DOM.

pub mod browser;
pub mod config;
pub mod scrape;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, Settings};
pub use scrape::{JobRequest, JobResult, ScrapeEngine, ScrapeError};
