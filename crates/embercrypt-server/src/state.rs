//! Shared application state.
//!
//! Built once at startup and handed to the router as `Arc<AppState>`. The
//! password service arrives through the constructor; handlers never look it
//! up anywhere else.

use std::sync::Arc;

use embercrypt_core::service::VaultPasswordService;

use crate::middleware::ApiToken;

/// Default request body limit when none is configured.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// State passed to every handler.
pub struct AppState {
    /// The service every vault password operation is delegated to.
    pub passwords: Arc<dyn VaultPasswordService>,
    /// Token required on the resource routes; `None` disables the check.
    pub api_token: Option<ApiToken>,
    pub max_body_bytes: usize,
}

impl AppState {
    #[must_use]
    pub fn new(passwords: Arc<dyn VaultPasswordService>, api_token: Option<ApiToken>) -> Self {
        Self {
            passwords,
            api_token,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api_token", &self.api_token)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}
