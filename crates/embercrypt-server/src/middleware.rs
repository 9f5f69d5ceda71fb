//! Token authentication for the resource routes.
//!
//! Accepts `Authorization: Bearer <token>` or `X-Vault-Token: <token>` and
//! compares it with the configured [`ApiToken`] in constant time. When the
//! state carries no token the middleware lets every request through; startup
//! only allows that when anonymous access was explicitly enabled.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Header accepted as an alternative to a bearer token.
pub const VAULT_TOKEN_HEADER: &str = "x-vault-token";

/// The shared secret clients present. Never shown in `Debug` output.
#[derive(Clone)]
pub struct ApiToken(String);

impl ApiToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Constant-time comparison against a presented token.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken([REDACTED])")
    }
}

/// Pull the presented token out of the request headers, if any.
fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim);

    bearer.or_else(|| {
        headers
            .get(VAULT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    })
}

/// Reject requests that do not carry the configured token.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_token.as_ref() else {
        return next.run(req).await;
    };

    let verdict = match presented_token(req.headers()) {
        None => Err("missing bearer token or X-Vault-Token header"),
        Some(token) if expected.matches(token) => Ok(()),
        Some(_) => Err("invalid token"),
    };

    match verdict {
        Ok(()) => next.run(req).await,
        Err(reason) => {
            debug!(path = %req.uri().path(), reason, "rejected unauthenticated request");
            AppError::Unauthorized(reason.to_owned()).into_response()
        }
    }
}
