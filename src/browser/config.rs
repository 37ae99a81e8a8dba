//! Browser engine configuration types.
//!
//! These types live outside `#[cfg(feature = "browser")]` so config parsing
//! works in builds without Chrome support.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed desktop viewport.
pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

/// Desktop user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36";

/// Browser engine types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrowserEngineType {
    /// Chromium with stealth patches (default).
    #[default]
    Stealth,

    /// No stealth patches (for debugging).
    Standard,
}

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserSettings {
    /// Browser engine type.
    #[serde(default)]
    pub engine: BrowserEngineType,

    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Explicit Chrome executable. Discovered from common paths when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Per-navigation and per-selector-wait timeout in seconds.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// Upper bound on the auto-scroll loop in seconds.
    #[serde(default = "default_max_scroll_duration")]
    pub max_scroll_duration: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            engine: BrowserEngineType::default(),
            headless: default_headless(),
            chrome_path: None,
            chrome_args: Vec::new(),
            navigation_timeout: default_navigation_timeout(),
            max_scroll_duration: default_max_scroll_duration(),
        }
    }
}

impl BrowserSettings {
    /// Apply environment variable overrides.
    ///
    /// - `CHROME_PATH` - Chrome executable
    /// - `BROWSER_HEADLESS` - `false`/`0` shows the browser window
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CHROME_PATH").filter(|v| !v.is_empty()) {
            self.chrome_path = Some(PathBuf::from(path));
        }
        if let Some(val) = lookup("BROWSER_HEADLESS") {
            match val.to_lowercase().as_str() {
                "false" | "0" | "no" => self.headless = false,
                "true" | "1" | "yes" => self.headless = true,
                _ => {}
            }
        }
        self
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout)
    }

    pub fn max_scroll_duration(&self) -> Duration {
        Duration::from_secs(self.max_scroll_duration)
    }
}

pub fn default_headless() -> bool {
    true
}

pub fn default_navigation_timeout() -> u64 {
    60
}

pub fn default_max_scroll_duration() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_browser_engine_type_serde() {
        let stealth: BrowserEngineType = serde_json::from_str("\"stealth\"").unwrap();
        assert_eq!(stealth, BrowserEngineType::Stealth);

        let standard: BrowserEngineType = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(standard, BrowserEngineType::Standard);
    }

    #[test]
    fn test_serde_defaults_match_default() {
        let config: BrowserSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BrowserSettings::default());
        assert!(config.headless);
        assert_eq!(config.navigation_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_scroll_duration(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CHROME_PATH", "/opt/chromium/chrome"),
            ("BROWSER_HEADLESS", "false"),
        ]
        .into_iter()
        .collect();

        let config =
            BrowserSettings::default().apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.chrome_path, Some(PathBuf::from("/opt/chromium/chrome")));
        assert!(!config.headless);
    }

    #[test]
    fn test_unrecognized_headless_value_is_ignored() {
        let config = BrowserSettings::default()
            .apply_env(|k| (k == "BROWSER_HEADLESS").then(|| "maybe".to_string()));
        assert!(config.headless);
    }
}
