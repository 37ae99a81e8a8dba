//! Configuration for scrape-relay using the prefer crate.
//!
//! A `scrape-relay.{toml,yaml,json}` file is optional. Environment variables
//! are applied on top of whatever the file provides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::browser::BrowserSettings;
use crate::scrape::LimitsConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} config {}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    #[error("API_KEY must be set; refusing to start without a credential")]
    MissingApiKey,
}

/// Deployment mode. Development mode exposes error chains in 500 responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// HTTP listener and credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token every request must present. Required at startup.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            environment: Environment::default(),
        }
    }
}

impl ServerConfig {
    /// Apply `HOST`, `PORT`, `API_KEY` and `APP_ENV`.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|v| !v.is_empty()) {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring invalid PORT value {:?}", port),
            }
        }
        if let Some(key) = lookup("API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(env) = lookup("APP_ENV") {
            match Environment::parse(&env) {
                Some(env) => self.environment = env,
                None => warn!("Ignoring unknown APP_ENV value {:?}", env),
            }
        }
        self
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub browser: BrowserSettings,

    #[serde(default)]
    pub limits: LimitsConfig,

    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery, falling back to
    /// defaults when no file is found. Environment overrides are applied.
    pub async fn load() -> Self {
        let discovered = match prefer::load("scrape-relay").await {
            Ok(pref_config) => pref_config.source_path().map(|p| p.to_path_buf()),
            // No config file found
            Err(_) => None,
        };

        let config = match discovered {
            Some(path) => match Self::load_from_path(&path).await {
                Ok(config) => config,
                Err(e) => {
                    warn!("{}; using defaults", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Load configuration from a specific file path, by extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext).map_err(|(format, reason)| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                format,
                reason,
            }
        })?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, (&'static str, String)> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ("TOML", e.to_string())),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ("YAML", e.to_string())),
            _ => serde_json::from_str(contents).map_err(|e| ("JSON", e.to_string())),
        }
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`.
    pub fn apply_env<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            server: self.server.apply_env(&lookup),
            browser: self.browser.apply_env(&lookup),
            limits: self.limits.apply_env(&lookup),
            source_path: self.source_path,
        }
    }

    /// Resolve into runtime settings. Fails without an API key.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let api_key = self
            .server
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Settings {
            host: self.server.host,
            port: self.server.port,
            api_key,
            environment: self.server.environment,
            browser: self.browser,
            limits: self.limits,
        })
    }
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub environment: Environment,
    pub browser: BrowserSettings,
    pub limits: LimitsConfig,
}

impl Settings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
