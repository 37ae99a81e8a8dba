//! One page visit: navigate, scroll, extract.

use std::time::Duration;

use tracing::debug;

use super::error::ScrapeError;
use super::extract::extract_from_html;
use super::job::Selectors;
use super::types::ExtractedItem;
use crate::browser::{navigate, scroll_to_bottom, BrowserSettings, PageDriver, ScrollOptions};

/// Per-page timing knobs.
#[derive(Debug, Clone)]
pub struct VisitOptions {
    pub navigation_timeout: Duration,
    pub scroll: ScrollOptions,
}

impl Default for VisitOptions {
    fn default() -> Self {
        Self::from(&BrowserSettings::default())
    }
}

impl From<&BrowserSettings> for VisitOptions {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            navigation_timeout: settings.navigation_timeout(),
            scroll: ScrollOptions {
                max_duration: settings.max_scroll_duration(),
                ..ScrollOptions::default()
            },
        }
    }
}

/// Visit `url` on `page` and return the items it lists, in document order.
pub async fn scrape_page(
    page: &dyn PageDriver,
    url: &str,
    selectors: &Selectors,
    options: &VisitOptions,
) -> Result<Vec<ExtractedItem>, ScrapeError> {
    navigate(
        page,
        url,
        selectors.wait.as_deref(),
        options.navigation_timeout,
    )
    .await
    .map_err(|source| ScrapeError::Navigation {
        url: url.to_string(),
        source,
    })?;

    let outcome = scroll_to_bottom(page, &options.scroll).await;
    debug!(
        "Scrolled {} ({} ticks, {}px, {:?})",
        url, outcome.ticks, outcome.scrolled, outcome.stop
    );

    let html = page
        .content()
        .await
        .map_err(|source| ScrapeError::Navigation {
            url: url.to_string(),
            source,
        })?;

    extract_from_html(&html, url, selectors.main.as_deref()).map_err(|e| {
        ScrapeError::Extraction {
            url: url.to_string(),
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePage, FakeSite};

    fn fast() -> VisitOptions {
        VisitOptions {
            navigation_timeout: Duration::from_secs(1),
            scroll: ScrollOptions {
                interval: Duration::from_millis(1),
                max_duration: Duration::from_millis(50),
                ..ScrollOptions::default()
            },
        }
    }

    #[tokio::test]
    async fn test_scrape_page_extracts_cards() {
        let site = FakeSite::new().page(
            "https://example.com/films",
            FakePage::cards("Film", 3).with_height(250.0),
        );
        let driver = site.driver();

        let items = scrape_page(&driver, "https://example.com/films", &Selectors::default(), &fast())
            .await
            .unwrap();

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Film 1", "Film 2", "Film 3"]);
        assert_eq!(items[0].link, "https://example.com/show/Film-1");
        assert_eq!(driver.scroll_ticks(), 3);
    }

    #[tokio::test]
    async fn test_missing_wait_selector_is_navigation_error() {
        let site = FakeSite::new().page("https://example.com/films", FakePage::cards("Film", 1));
        let driver = site.driver();
        let selectors = Selectors {
            wait: Some(".never".into()),
            main: None,
        };

        let err = scrape_page(&driver, "https://example.com/films", &selectors, &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_invalid_container_is_extraction_error() {
        let site = FakeSite::new().page("https://example.com/films", FakePage::cards("Film", 1));
        let driver = site.driver();
        let selectors = Selectors {
            wait: None,
            main: Some(">>>".into()),
        };

        let err = scrape_page(&driver, "https://example.com/films", &selectors, &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction { .. }));
        assert!(err.is_page_level());
    }

    #[test]
    fn test_visit_options_follow_browser_settings() {
        let settings = BrowserSettings {
            navigation_timeout: 15,
            max_scroll_duration: 5,
            ..BrowserSettings::default()
        };
        let options = VisitOptions::from(&settings);
        assert_eq!(options.navigation_timeout, Duration::from_secs(15));
        assert_eq!(options.scroll.max_duration, Duration::from_secs(5));
        assert_eq!(options.scroll.distance, 100);
    }
}
