//! In-memory browser fakes for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::browser::{BrowserError, BrowserSession, PageDriver, SessionLauncher};

/// A canned page: its HTML and how its scrollable height behaves.
#[derive(Debug, Clone)]
pub(crate) struct FakePage {
    html: String,
    height: f64,
    growth: f64,
}

impl FakePage {
    pub(crate) fn html(html: &str) -> Self {
        Self {
            html: html.to_string(),
            height: 0.0,
            growth: 0.0,
        }
    }

    /// A listing page with `count` `.card` elements titled `{label} {i}`.
    pub(crate) fn cards(label: &str, count: usize) -> Self {
        let cards: String = (1..=count)
            .map(|i| {
                format!(
                    r#"<div class="card"><h2>{label} {i}</h2><a href="/show/{label}-{i}">more</a></div>"#
                )
            })
            .collect();
        Self::html(&format!("<html><body>{}</body></html>", cards))
    }

    pub(crate) fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Grow the scrollable height by `growth` after every scroll tick.
    pub(crate) fn growing_by(mut self, growth: f64) -> Self {
        self.growth = growth;
        self
    }
}

#[derive(Default)]
struct SiteState {
    pages: Mutex<HashMap<String, FakePage>>,
    failing: Mutex<HashSet<String>>,
    visits: Mutex<Vec<String>>,
    launches: AtomicUsize,
    releases: AtomicUsize,
}

/// A set of fake pages plus counters shared by every driver and session.
#[derive(Clone, Default)]
pub(crate) struct FakeSite {
    state: Arc<SiteState>,
}

impl FakeSite {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(self, url: &str, page: FakePage) -> Self {
        self.state
            .pages
            .lock()
            .unwrap()
            .insert(url.to_string(), page);
        self
    }

    /// Navigating to `url` fails.
    pub(crate) fn failing(self, url: &str) -> Self {
        self.state.failing.lock().unwrap().insert(url.to_string());
        self
    }

    pub(crate) fn driver(&self) -> FakeDriver {
        FakeDriver {
            state: self.state.clone(),
            current: Mutex::new(None),
            ticks: AtomicU32::new(0),
        }
    }

    pub(crate) fn launcher(&self) -> FakeLauncher {
        FakeLauncher {
            site: self.clone(),
            fail_launch: false,
        }
    }

    /// A launcher whose browser never starts.
    pub(crate) fn broken_launcher(&self) -> FakeLauncher {
        FakeLauncher {
            site: self.clone(),
            fail_launch: true,
        }
    }

    pub(crate) fn visits(&self) -> Vec<String> {
        self.state.visits.lock().unwrap().clone()
    }

    pub(crate) fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    pub(crate) fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }
}

struct Loaded {
    url: String,
    height: f64,
}

pub(crate) struct FakeDriver {
    state: Arc<SiteState>,
    current: Mutex<Option<Loaded>>,
    ticks: AtomicU32,
}

impl FakeDriver {
    pub(crate) fn scroll_ticks(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn current_page(&self) -> Option<FakePage> {
        let current = self.current.lock().unwrap();
        let url = &current.as_ref()?.url;
        self.state.pages.lock().unwrap().get(url).cloned()
    }
}

fn selector_matches(html: &str, selector: &str) -> bool {
    let Ok(selector) = Selector::parse(selector) else {
        return false;
    };
    Html::parse_document(html).select(&selector).next().is_some()
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        self.state.visits.lock().unwrap().push(url.to_string());

        if self.state.failing.lock().unwrap().contains(url) {
            return Err(BrowserError::Navigation(format!("{}: net::ERR_CONNECTION_RESET", url)));
        }
        let page = self.state.pages.lock().unwrap().get(url).cloned();
        match page {
            Some(page) => {
                *self.current.lock().unwrap() = Some(Loaded {
                    url: url.to_string(),
                    height: page.height,
                });
                Ok(())
            }
            None => Err(BrowserError::Navigation(format!("{}: net::ERR_NAME_NOT_RESOLVED", url))),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let found = self
            .current_page()
            .is_some_and(|page| selector_matches(&page.html, selector));
        if found {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                what: format!("selector {}", selector),
                secs: timeout.as_secs(),
            })
        }
    }

    async fn scroll_by(&self, _distance: u32) -> Result<f64, BrowserError> {
        let growth = self.current_page().map(|p| p.growth).unwrap_or_default();
        let mut current = self.current.lock().unwrap();
        let loaded = current
            .as_mut()
            .ok_or_else(|| BrowserError::Script("no document loaded".into()))?;
        let height = loaded.height;
        loaded.height += growth;
        self.ticks.fetch_add(1, Ordering::SeqCst);
        Ok(height)
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.current_page()
            .map(|page| page.html)
            .ok_or_else(|| BrowserError::Script("no document loaded".into()))
    }
}

pub(crate) struct FakeLauncher {
    site: FakeSite,
    fail_launch: bool,
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if self.fail_launch {
            return Err(BrowserError::Launch("Chrome/Chromium not found".into()));
        }
        self.site.state.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            driver: self.site.driver(),
            state: self.site.state.clone(),
            released: false,
        }))
    }
}

struct FakeSession {
    driver: FakeDriver,
    state: Arc<SiteState>,
    released: bool,
}

#[async_trait]
impl BrowserSession for FakeSession {
    fn page(&self) -> &dyn PageDriver {
        &self.driver
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.state.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}
