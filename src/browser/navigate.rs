//! Page navigation with readiness waits.

use std::time::Duration;

use tracing::debug;

use super::{BrowserError, PageDriver};

/// Lifecycle event Chrome emits once at most 2 connections stayed open for 500ms.
const NETWORK_ALMOST_IDLE: &str = "networkAlmostIdle";

/// Lifecycle event that starts a new document in a frame.
const INIT: &str = "init";

/// Follows the main frame's current document across lifecycle events.
///
/// A client-side redirect during load commits a new loader in the same
/// frame, so the idle signal to wait for is the one for the frame's latest
/// loader, not the one `Page.navigate` returned.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
#[derive(Debug, Clone)]
pub(crate) struct DocumentTracker {
    frame_id: String,
    loader_id: String,
}

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
impl DocumentTracker {
    pub(crate) fn new(frame_id: impl Into<String>, loader_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            loader_id: loader_id.into(),
        }
    }

    pub(crate) fn loader_id(&self) -> &str {
        &self.loader_id
    }

    /// Feed one lifecycle event. Returns true once the tracked frame's
    /// current document reports network idle.
    pub(crate) fn observe(&mut self, frame_id: &str, loader_id: &str, name: &str) -> bool {
        if frame_id != self.frame_id {
            return false;
        }
        match name {
            INIT if loader_id != self.loader_id => {
                debug!("Frame {} moved to loader {}", frame_id, loader_id);
                self.loader_id = loader_id.to_string();
                false
            }
            NETWORK_ALMOST_IDLE => loader_id == self.loader_id,
            _ => false,
        }
    }
}

/// Navigate `page` to `url`, wait for the network to settle, then for
/// `wait_selector` when one is given. Both waits share the same `timeout`
/// budget each. A selector that never appears is an error.
pub async fn navigate(
    page: &dyn PageDriver,
    url: &str,
    wait_selector: Option<&str>,
    timeout: Duration,
) -> Result<(), BrowserError> {
    page.goto(url, timeout).await?;

    if let Some(selector) = wait_selector.filter(|s| !s.trim().is_empty()) {
        debug!("Waiting for selector {} on {}", selector, url);
        page.wait_for_selector(selector, timeout).await?;
    }

    Ok(())
}
