//! End-to-end job flow through the public API, using a static in-memory
//! site in place of Chrome.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use scrape_relay::browser::{BrowserError, BrowserSession, PageDriver, ScrollOptions, SessionLauncher};
use scrape_relay::config::Environment;
use scrape_relay::scrape::{Admission, JobRequest, ScrapeEngine, VisitOptions};
use scrape_relay::server::{create_router, AppState, AuthState};

#[derive(Default)]
struct Counters {
    launches: AtomicUsize,
    releases: AtomicUsize,
    visits: Mutex<Vec<String>>,
}

/// URL -> HTML. Unknown URLs fail to load.
#[derive(Clone)]
struct StaticSite {
    pages: Arc<HashMap<String, String>>,
    counters: Arc<Counters>,
}

impl StaticSite {
    fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.clone()))
                    .collect(),
            ),
            counters: Arc::new(Counters::default()),
        }
    }

    fn visits(&self) -> Vec<String> {
        self.counters.visits.lock().unwrap().clone()
    }
}

struct StaticPage {
    site: StaticSite,
    current: Mutex<Option<String>>,
}

#[async_trait]
impl PageDriver for StaticPage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        self.site.counters.visits.lock().unwrap().push(url.to_string());
        let html = self
            .site
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::Navigation(format!("{}: 404", url)))?;
        *self.current.lock().unwrap() = Some(html);
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let found = self
            .current
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|html| html.contains(selector.trim_start_matches('.')));
        if found {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                what: selector.to_string(),
                secs: timeout.as_secs(),
            })
        }
    }

    async fn scroll_by(&self, _distance: u32) -> Result<f64, BrowserError> {
        Ok(0.0)
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BrowserError::Script("blank page".into()))
    }
}

struct StaticSession {
    page: StaticPage,
    released: bool,
}

#[async_trait]
impl BrowserSession for StaticSession {
    fn page(&self) -> &dyn PageDriver {
        &self.page
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.page.site.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl SessionLauncher for StaticSite {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticSession {
            page: StaticPage {
                site: self.clone(),
                current: Mutex::new(None),
            },
            released: false,
        }))
    }
}

fn listing(prefix: &str, count: usize) -> String {
    let items: String = (1..=count)
        .map(|i| {
            format!(
                r#"<li class="item">
                     <a href="/title/{prefix}{i}"><img data-src="/posters/{prefix}{i}.jpg" src=""></a>
                     <h3>{prefix} {i}</h3>
                     <p class="synopsis">About {prefix} {i}</p>
                     <span class="userRating">8.{i}</span>
                     <span class="releaseYear">200{i}</span>
                   </li>"#
            )
        })
        .collect();
    format!(r#"<html><body><ul class="results">{}</ul></body></html>"#, items)
}

fn visit_options() -> VisitOptions {
    VisitOptions {
        navigation_timeout: Duration::from_secs(1),
        scroll: ScrollOptions {
            interval: Duration::from_millis(1),
            max_duration: Duration::from_millis(20),
            ..ScrollOptions::default()
        },
    }
}

#[tokio::test]
async fn paginated_job_over_http() {
    let site = StaticSite::new(&[
        ("https://films.example/list?page=1", listing("a", 2)),
        ("https://films.example/list?page=2", listing("b", 2)),
        ("https://films.example/list?page=3", listing("c", 2)),
        ("https://films.example/list?page=4", listing("d", 2)),
    ]);
    let engine = ScrapeEngine::new(Arc::new(site.clone()), visit_options());
    let app = create_router(
        AppState::new(engine, Environment::Production),
        AuthState::new("k"),
    );

    let body = r#"{
        "source": "tmdb-films",
        "type": "film",
        "urls": ["https://films.example/list?page=1"],
        "selectors": { "wait": ".results" },
        "pagination": { "pattern": "page", "max": 10 },
        "minItems": 5
    }"#;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/scrape")
                .header(header::AUTHORIZATION, "Bearer k")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    // 2 + 2 + 2 = 6 >= 5 after page 3
    assert_eq!(json["count"], 6);
    assert_eq!(
        site.visits(),
        vec![
            "https://films.example/list?page=1",
            "https://films.example/list?page=2",
            "https://films.example/list?page=3",
        ]
    );

    let items = json["items"].as_array().unwrap();
    let titles: Vec<_> = items.iter().map(|i| i["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["a 1", "a 2", "b 1", "b 2", "c 1", "c 2"]);

    let first = &items[0];
    assert_eq!(first["link"], "https://films.example/title/a1");
    assert_eq!(first["poster_url"], "https://films.example/posters/a1.jpg");
    assert_eq!(first["description"], "About a 1");
    assert_eq!(first["rating"], "8.1");
    assert_eq!(first["year"], "2001");
    assert_eq!(first["source"], "tmdb-films");
    assert_eq!(first["type"], "film");
    assert_eq!(first["url"], "https://films.example/list?page=1");
    assert_eq!(items[4]["url"], "https://films.example/list?page=3");

    assert_eq!(site.counters.launches.load(Ordering::SeqCst), 1);
    assert_eq!(site.counters.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_jobs_each_get_their_own_session() {
    let site = StaticSite::new(&[
        ("https://films.example/a", listing("a", 1)),
        ("https://films.example/b", listing("b", 1)),
    ]);
    let engine = ScrapeEngine::new(Arc::new(site.clone()), visit_options())
        .with_admission(Admission::new(1, Duration::from_secs(5)));

    let job = |url: &str| JobRequest {
        source: Some("imdb-films".into()),
        urls: Some(vec![url.to_string()]),
        ..Default::default()
    };

    let (a, b) = tokio::join!(
        engine.run(job("https://films.example/a")),
        engine.run(job("https://films.example/b")),
    );
    assert_eq!(a.unwrap().items[0].item.title, "a 1");
    assert_eq!(b.unwrap().items[0].item.title, "b 1");
    assert_eq!(site.counters.launches.load(Ordering::SeqCst), 2);
    assert_eq!(site.counters.releases.load(Ordering::SeqCst), 2);
}
