//! Request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use super::{AppState, ErrorBody};
use crate::scrape::{JobRequest, ScrapeError, SUPPORTED_SOURCES};

/// POST /scrape - run one job and return its result.
pub async fn scrape(
    State(state): State<AppState>,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected scrape body: {}", rejection.body_text());
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody::with_details("Invalid parameters", rejection.body_text())),
            )
                .into_response();
        }
    };

    match state.engine.run(request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => scrape_error_response(e, state.environment.is_development()),
    }
}

fn scrape_error_response(err: ScrapeError, development: bool) -> Response {
    match err {
        ScrapeError::Validation(details) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody::with_details("Invalid parameters", details)),
        )
            .into_response(),
        ScrapeError::Busy { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorBody::with_details("Service busy", err.to_string())),
        )
            .into_response(),
        other => {
            error!("Scraping failed: {}", other.chain());
            let mut body = json!({
                "error": "Scraping failed",
                "message": other.to_string(),
            });
            if development {
                body["stack"] = json!(other.chain());
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// GET /status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": format_uptime(state.started_at.elapsed().as_secs()),
    }))
}

/// GET /sources
pub async fn sources() -> impl IntoResponse {
    Json(json!({ "sources": SUPPORTED_SOURCES }))
}

/// Render seconds as `"{days}j {hours}h {minutes}m {seconds}s"`.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    format!("{}j {}h {}m {}s", days, hours, minutes, seconds)
}
