//! HTTP surface for the relay.
//!
//! Provides:
//! - `POST /scrape` running one job through the [`ScrapeEngine`]
//! - `GET /status` with version and uptime
//! - `GET /sources` listing supported source identifiers
//!
//! Every route requires `Authorization: Bearer <API_KEY>`.

mod auth;
mod handlers;
mod routes;

pub use auth::{AuthError, AuthState};
pub use handlers::format_uptime;
pub use routes::{create_router, BODY_LIMIT};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use serde::Serialize;

use crate::browser::default_launcher;
use crate::config::{Environment, Settings};
use crate::scrape::{Admission, ScrapeEngine, VisitOptions};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub engine: ScrapeEngine,
    pub environment: Environment,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: ScrapeEngine, environment: Environment) -> Self {
        Self {
            engine,
            environment,
            started_at: Instant::now(),
        }
    }

    /// Build the engine described by `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let engine = ScrapeEngine::new(
            default_launcher(&settings.browser),
            VisitOptions::from(&settings.browser),
        )
        .with_admission(Admission::from(&settings.limits));
        Self::new(engine, settings.environment)
    }
}

/// JSON error body: `{ error, details? }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings);
    let auth = AuthState::new(Arc::<str>::from(settings.api_key.as_str()));
    let app = create_router(state, auth);

    let addr: SocketAddr = settings
        .bind_address()
        .parse()
        .with_context(|| format!("invalid listen address {}", settings.bind_address()))?;
    tracing::info!(
        "Starting scrape relay at http://{} ({:?}, {} concurrent jobs)",
        addr,
        settings.environment,
        settings.limits.max_concurrent_jobs
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
