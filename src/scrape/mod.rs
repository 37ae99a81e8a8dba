//! Scrape jobs: validation, page visits, extraction, pagination and the
//! orchestration engine that ties them together.

mod admission;
mod engine;
mod error;
pub mod extract;
mod job;
mod page;
pub mod pagination;
mod types;

pub use admission::{Admission, LimitsConfig};
pub use engine::ScrapeEngine;
pub use error::ScrapeError;
pub use job::{Job, JobRequest, PaginationRule, Selectors, VALIDATION_DETAILS};
pub use page::{scrape_page, VisitOptions};
pub use types::{ExtractedItem, JobResult, ResultItem};

/// Source identifiers advertised by `/sources`.
pub const SUPPORTED_SOURCES: &[&str] = &[
    "allocine-films",
    "allocine-series",
    "senscritique-films",
    "senscritique-series",
    "imdb-films",
    "imdb-series",
    "tmdb-films",
    "tmdb-series",
];
