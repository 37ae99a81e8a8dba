//! Command implementations.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use scrape_relay::browser::default_launcher;
use scrape_relay::config::Config;
use scrape_relay::scrape::{JobRequest, ScrapeEngine, VisitOptions, SUPPORTED_SOURCES};
use scrape_relay::server;

/// Load config from `path` when given, otherwise by discovery.
async fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(Config::load_from_path(path).await?.with_env_overrides()),
        None => Ok(Config::load().await),
    }
}

pub async fn cmd_serve(
    config: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = load_config(config).await?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(path) = &config.source_path {
        info!("Using config file {}", path.display());
    }

    let settings = config.into_settings().context("cannot start server")?;
    server::serve(&settings).await
}

pub async fn cmd_scrape(config: Option<&Path>, job_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config).await?;

    let contents = tokio::fs::read_to_string(job_path)
        .await
        .with_context(|| format!("failed to read job file {}", job_path.display()))?;
    let request: JobRequest = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse job file {}", job_path.display()))?;

    let engine = ScrapeEngine::new(
        default_launcher(&config.browser),
        VisitOptions::from(&config.browser),
    );
    let result = engine.run(request).await.map_err(|e| anyhow::anyhow!(e.chain()))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn cmd_sources() -> anyhow::Result<()> {
    for source in SUPPORTED_SOURCES {
        println!("{}", source);
    }
    Ok(())
}
