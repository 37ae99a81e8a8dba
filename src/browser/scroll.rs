//! Incremental scrolling to trigger lazy-loaded content.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::PageDriver;

/// Scroll cadence and bounds.
#[derive(Debug, Clone)]
pub struct ScrollOptions {
    /// Pixels scrolled per tick.
    pub distance: u32,
    /// Delay between ticks.
    pub interval: Duration,
    /// Hard wall-clock bound on the whole loop.
    pub max_duration: Duration,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            distance: 100,
            interval: Duration::from_millis(100),
            max_duration: Duration::from_secs(30),
        }
    }
}

/// Why the scroll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStop {
    /// Scrolled at least the page's last-read height.
    ReachedBottom,
    /// `max_duration` elapsed while the page kept growing.
    TimeLimit,
    /// The page stopped answering scroll scripts.
    ScriptFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub ticks: u32,
    pub scrolled: u64,
    pub stop: ScrollStop,
}

/// Scroll `page` down until the distance scrolled reaches the scrollable
/// height. The height is re-read on every tick since lazy loading grows it.
///
/// Best-effort: failures end the loop but are never returned.
pub async fn scroll_to_bottom(page: &dyn PageDriver, options: &ScrollOptions) -> ScrollOutcome {
    let started = Instant::now();
    let mut ticks = 0u32;
    let mut scrolled = 0u64;

    loop {
        let height = match page.scroll_by(options.distance).await {
            Ok(height) => height,
            Err(e) => {
                debug!("Auto-scroll stopped after {} ticks: {}", ticks, e);
                return ScrollOutcome {
                    ticks,
                    scrolled,
                    stop: ScrollStop::ScriptFailed,
                };
            }
        };
        ticks += 1;
        scrolled += u64::from(options.distance);

        if scrolled as f64 >= height {
            return ScrollOutcome {
                ticks,
                scrolled,
                stop: ScrollStop::ReachedBottom,
            };
        }

        if started.elapsed() >= options.max_duration {
            warn!(
                "Auto-scroll gave up after {:?} ({} ticks, page height {})",
                options.max_duration, ticks, height
            );
            return ScrollOutcome {
                ticks,
                scrolled,
                stop: ScrollStop::TimeLimit,
            };
        }

        tokio::time::sleep(options.interval).await;
    }
}
