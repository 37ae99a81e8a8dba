//! chromiumoxide-backed sessions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, NavigateParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::{BrowserEngineType, BrowserSettings, USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use super::navigate::DocumentTracker;
use super::{intercept, stealth, BrowserError, BrowserSession, PageDriver, SessionLauncher};

/// Poll interval while waiting for a selector to appear.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launches a fresh headless Chrome per job.
pub struct ChromeLauncher {
    settings: BrowserSettings,
}

impl ChromeLauncher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    /// Find the Chrome executable, preferring the configured one.
    fn find_chrome(&self) -> Result<PathBuf, BrowserError> {
        if let Some(ref path) = self.settings.chrome_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(BrowserError::Launch(format!(
                "configured Chrome executable not found: {}",
                path.display()
            )));
        }

        for path in Self::CHROME_PATHS {
            let p = Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in [
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                debug!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(BrowserError::Launch(
            "Chrome/Chromium not found. Install it or set CHROME_PATH:\n\
             - Ubuntu/Debian: sudo apt install chromium\n\
             - Fedora: sudo dnf install chromium\n\
             - Alpine: apk add chromium"
                .to_string(),
        ))
    }

    fn browser_config(&self, chrome: PathBuf, profile: &Path) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .user_data_dir(profile)
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .viewport(Viewport {
                width: VIEWPORT_WIDTH,
                height: VIEWPORT_HEIGHT,
                ..Default::default()
            });

        // with_head means NOT headless
        if !self.settings.headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-accelerated-2d-canvas")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if self.settings.engine == BrowserEngineType::Stealth {
            builder = builder
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--disable-infobars");
        }

        for arg in &self.settings.chrome_args {
            builder = builder.arg(arg);
        }

        builder
            .build()
            .map_err(|e| BrowserError::Launch(format!("invalid browser config: {}", e)))
    }

    /// Configure the freshly opened page: user agent, stealth, interception,
    /// lifecycle events.
    async fn prepare_page(&self, page: &Page) -> Result<JoinHandle<()>, BrowserError> {
        page.execute(SetUserAgentOverrideParams::new(USER_AGENT.to_string()))
            .await
            .map_err(launch_err)?;

        if self.settings.engine == BrowserEngineType::Stealth {
            stealth::install(page).await;
        }

        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(launch_err)?;

        intercept::block_heavy_resources(page)
            .await
            .map_err(launch_err)
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let chrome = self.find_chrome()?;
        let profile = tempfile::Builder::new()
            .prefix("scrape-relay-")
            .tempdir()
            .map_err(|e| BrowserError::Launch(format!("cannot create profile dir: {}", e)))?;

        info!("Launching browser (headless={})", self.settings.headless);
        let config = self.browser_config(chrome, profile.path())?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(launch_err)?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let mut session = ChromeSession {
            browser,
            page: None,
            handler_task,
            intercept_task: None,
            _profile: profile,
            released: false,
        };

        // The browser is already running: tear it down if page setup fails
        let page = match session.browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                session.release().await;
                return Err(launch_err(e));
            }
        };
        match self.prepare_page(&page).await {
            Ok(task) => session.intercept_task = Some(task),
            Err(e) => {
                session.release().await;
                return Err(e);
            }
        }
        session.page = Some(ChromePage { page });

        Ok(Box::new(session))
    }
}

fn launch_err(e: chromiumoxide::error::CdpError) -> BrowserError {
    BrowserError::Launch(e.to_string())
}

/// One Chrome process, its profile directory and its single page.
///
/// Dropping the session without `release` still kills the child process
/// (chromiumoxide kills it on drop) and removes the profile directory.
pub struct ChromeSession {
    browser: Browser,
    page: Option<ChromePage>,
    handler_task: JoinHandle<()>,
    intercept_task: Option<JoinHandle<()>>,
    _profile: TempDir,
    released: bool,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    fn page(&self) -> &dyn PageDriver {
        match self.page {
            Some(ref page) => page as &dyn PageDriver,
            None => &DetachedPage as &dyn PageDriver,
        }
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(task) = self.intercept_task.take() {
            task.abort();
        }
        self.page = None;

        if let Err(e) = self.browser.close().await {
            warn!("Browser close command failed: {}", e);
        }
        match self.browser.wait().await {
            Ok(status) => debug!("Browser exited: {:?}", status),
            Err(e) => warn!("Failed waiting for browser exit: {}", e),
        }
        self.handler_task.abort();
        info!("Browser session released");
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Some(task) = self.intercept_task.take() {
            task.abort();
        }
        self.handler_task.abort();
    }
}

/// Stand-in returned by `page()` after release.
struct DetachedPage;

#[async_trait]
impl PageDriver for DetachedPage {
    async fn goto(&self, _url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        Err(BrowserError::Navigation("browser session already released".into()))
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout: Duration) -> Result<(), BrowserError> {
        Err(BrowserError::Navigation("browser session already released".into()))
    }

    async fn scroll_by(&self, _distance: u32) -> Result<f64, BrowserError> {
        Err(BrowserError::Script("browser session already released".into()))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        Err(BrowserError::Script("browser session already released".into()))
    }
}

struct ChromePage {
    page: Page,
}

impl ChromePage {
    /// Navigate and return a tracker for the main frame's new document, if
    /// the navigation created one.
    async fn start_navigation(&self, url: &str) -> Result<Option<DocumentTracker>, BrowserError> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| BrowserError::Navigation(format!("invalid URL {}: {}", url, e)))?;

        let response = self
            .page
            .execute(params)
            .await
            .map_err(|e| BrowserError::Navigation(format!("{}: {}", url, e)))?;

        if let Some(ref error_text) = response.result.error_text {
            return Err(BrowserError::Navigation(format!("{}: {}", url, error_text)));
        }

        let frame_id = response.result.frame_id.inner().clone();
        Ok(response
            .result
            .loader_id
            .as_ref()
            .map(|loader_id| DocumentTracker::new(frame_id, loader_id.inner().clone())))
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        info!("Navigating to {}", url);

        // Subscribe before navigating so no lifecycle event is missed
        let mut lifecycle = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;

        let settle = async {
            let Some(mut document) = self.start_navigation(url).await? else {
                // Same-document navigation: nothing new to load
                return Ok(());
            };
            while let Some(event) = lifecycle.next().await {
                if document.observe(event.frame_id.inner(), event.loader_id.inner(), &event.name) {
                    debug!("Network idle for {}", url);
                    return Ok(());
                }
            }
            Err(BrowserError::Navigation(format!(
                "{}: page closed before network settled",
                url
            )))
        };

        tokio::time::timeout(timeout, settle)
            .await
            .map_err(|_| BrowserError::Timeout {
                what: format!("network idle on {}", url),
                secs: timeout.as_secs(),
            })?
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        debug!("Waiting for selector: {}", selector);
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| BrowserError::Timeout {
                what: format!("selector {}", selector),
                secs: timeout.as_secs(),
            })
    }

    async fn scroll_by(&self, distance: u32) -> Result<f64, BrowserError> {
        let script = format!(
            "(() => {{ \
                const height = document.body ? document.body.scrollHeight : 0; \
                window.scrollBy(0, {}); \
                return height; \
            }})()",
            distance
        );
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?
            .into_value::<f64>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))
    }
}
