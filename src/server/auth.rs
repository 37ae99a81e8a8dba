//! Bearer-token authentication middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::debug;

use super::ErrorBody;

/// Why a request was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    Missing,

    #[error("Invalid API key")]
    Invalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Missing => StatusCode::UNAUTHORIZED,
            AuthError::Invalid => StatusCode::FORBIDDEN,
        };
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// The configured credential, read-only after startup.
#[derive(Clone)]
pub struct AuthState {
    api_key: Arc<str>,
}

impl AuthState {
    pub fn new(api_key: impl Into<Arc<str>>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Check an `Authorization` header value.
    pub fn check(&self, header: Option<&str>) -> Result<(), AuthError> {
        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AuthError::Missing)?;
        if token == &*self.api_key {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }
}

/// Reject requests without `Authorization: Bearer <api key>`.
pub async fn require_bearer(
    State(auth): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth.check(header) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            debug!("Rejected {} {}: {}", request.method(), request.uri(), e);
            e.into_response()
        }
    }
}
