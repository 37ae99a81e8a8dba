//! Follow-up page derivation and the pagination loop.

use tracing::{debug, info, warn};

use super::job::{PaginationRule, Selectors};
use super::page::{scrape_page, VisitOptions};
use super::types::ExtractedItem;
use crate::browser::PageDriver;

/// A URL split around the digit run that ends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNumber<'a> {
    pub prefix: &'a str,
    pub number: i128,
}

impl<'a> PageNumber<'a> {
    /// Locate the trailing digit run of `url`. `None` when the URL does not
    /// end in a digit or the number does not fit.
    pub fn parse(url: &'a str) -> Option<Self> {
        let digits = url.bytes().rev().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let split = url.len() - digits;
        let number = url[split..].parse().ok()?;
        Some(Self {
            prefix: &url[..split],
            number,
        })
    }

    /// URL for page `index` (1 is the seed). `None` if the number would be
    /// negative.
    pub fn url_for(&self, index: u32, offset: i64) -> Option<String> {
        let n = self
            .number
            .checked_add(i128::from(index.saturating_sub(1)) * i128::from(offset))?;
        (n >= 0).then(|| format!("{}{}", self.prefix, n))
    }
}

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStop {
    /// All pages up to `max` were handled.
    MaxPages,
    /// The job reached its `minItems` threshold.
    MinItems,
    /// The seed URL has no trailing page number.
    NoPageNumber,
    /// The derived page number went below zero.
    NegativePage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSummary {
    pub visited: u32,
    pub failed: u32,
    pub skipped: u32,
    pub stop: PaginationStop,
}

/// Visit pages 2..=`rule.max` derived from `seed`.
///
/// `on_page` receives each page URL and its items (empty for a failed page)
/// and returns the job's cumulative item count, which is checked against
/// `min_items` after every page.
pub async fn paginate<F>(
    page: &dyn PageDriver,
    seed: &str,
    rule: &PaginationRule,
    min_items: Option<usize>,
    selectors: &Selectors,
    options: &VisitOptions,
    mut on_page: F,
) -> PaginationSummary
where
    F: FnMut(&str, Vec<ExtractedItem>) -> usize,
{
    let mut summary = PaginationSummary {
        visited: 0,
        failed: 0,
        skipped: 0,
        stop: PaginationStop::MaxPages,
    };

    let Some(number) = PageNumber::parse(seed) else {
        warn!("Pagination skipped: no trailing page number in {}", seed);
        summary.stop = PaginationStop::NoPageNumber;
        return summary;
    };

    info!(
        "Paginating {} up to {} pages (offset {})",
        seed,
        rule.max,
        rule.offset()
    );

    let mut previous = seed.to_string();
    for index in 2..=rule.max {
        let Some(url) = number.url_for(index, rule.offset()) else {
            warn!("Pagination stopped: page {} of {} has a negative number", index, seed);
            summary.stop = PaginationStop::NegativePage;
            return summary;
        };

        if url == previous {
            debug!("Skipping page {}: URL unchanged ({})", index, url);
            summary.skipped += 1;
            continue;
        }

        let items = match scrape_page(page, &url, selectors, options).await {
            Ok(items) => {
                summary.visited += 1;
                info!("Extracted {} items from {}", items.len(), url);
                items
            }
            Err(e) => {
                summary.failed += 1;
                warn!("Page {} failed, continuing: {}", url, e);
                Vec::new()
            }
        };
        let total = on_page(&url, items);
        previous = url;

        if let Some(min) = min_items {
            if total >= min {
                info!("Reached {} items (min {}), stopping pagination", total, min);
                summary.stop = PaginationStop::MinItems;
                return summary;
            }
        }
    }

    debug!("Pagination of {} finished at max {}", seed, rule.max);
    summary
}
