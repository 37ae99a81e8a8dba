//! Browser session management for anti-bot protected sites.
//!
//! Uses chromiumoxide (CDP) to render pages in an isolated headless Chrome
//! with stealth evasion and heavy-resource blocking. The engine talks to the
//! browser only through the [`SessionLauncher`], [`BrowserSession`] and
//! [`PageDriver`] traits.

mod config;
#[cfg(feature = "browser")]
mod chrome;
#[cfg(feature = "browser")]
mod intercept;
mod navigate;
mod scroll;
#[cfg(feature = "browser")]
mod stealth;

pub use config::{
    BrowserEngineType, BrowserSettings, USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
};
pub use navigate::navigate;
pub use scroll::{scroll_to_bottom, ScrollOptions, ScrollOutcome, ScrollStop};

#[cfg(feature = "browser")]
pub use chrome::ChromeLauncher;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the browser layer.
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    #[error("page script failed: {0}")]
    Script(String),

    #[error("browser support not compiled; rebuild with `--features browser`")]
    NotCompiled,
}

/// A single browser tab the engine can drive.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to `url` and wait until the network is nearly idle.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Wait until `selector` matches an element in the DOM.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), BrowserError>;

    /// Read the current scrollable height, then scroll down by `distance` pixels.
    /// Returns the height read before scrolling.
    async fn scroll_by(&self, distance: u32) -> Result<f64, BrowserError>;

    /// Serialized HTML of the rendered DOM.
    async fn content(&self) -> Result<String, BrowserError>;
}

/// A launched browser process plus its single page, owned by one job.
#[async_trait]
pub trait BrowserSession: Send {
    fn page(&self) -> &dyn PageDriver;

    /// Terminate the browser and all its pages. Calling it twice is a no-op.
    async fn release(&mut self);
}

/// Creates one isolated browser session per job.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// Launcher used when the `browser` feature is disabled.
pub struct UnavailableLauncher;

#[async_trait]
impl SessionLauncher for UnavailableLauncher {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        Err(BrowserError::NotCompiled)
    }
}

/// Build the launcher for the current build configuration.
pub fn default_launcher(settings: &BrowserSettings) -> Arc<dyn SessionLauncher> {
    #[cfg(feature = "browser")]
    {
        Arc::new(ChromeLauncher::new(settings.clone()))
    }
    #[cfg(not(feature = "browser"))]
    {
        let _ = settings;
        Arc::new(UnavailableLauncher)
    }
}
