//! Shared helpers for the HTTP integration tests.
//!
//! Requests go straight into the router with `oneshot`; no socket is bound.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use embercrypt_core::crypto::EncryptionKey;
use embercrypt_core::service::{BarrierPasswordService, VaultPasswordService};
use embercrypt_server::middleware::ApiToken;
use embercrypt_server::routes::build_router;
use embercrypt_server::state::AppState;
use embercrypt_storage::MemoryBackend;

pub const TOKEN: &str = "test-token-0123456789";

/// A router over fresh in-memory storage.
pub struct TestApp {
    router: Router,
    token: Option<String>,
}

/// Everything the tests look at in a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// App requiring [`TOKEN`], with requests sending it.
    pub fn new() -> Self {
        Self::with_token(Some(TOKEN))
    }

    /// App requiring `token` (or nothing), with requests sending it.
    pub fn with_token(token: Option<&str>) -> Self {
        let service: Arc<dyn VaultPasswordService> = Arc::new(
            BarrierPasswordService::with_master_key(
                Arc::new(MemoryBackend::new()),
                &EncryptionKey::generate(),
            )
            .unwrap(),
        );
        let state = AppState::new(service, token.map(ApiToken::new)).with_max_body_bytes(4096);
        Self {
            router: build_router(Arc::new(state)),
            token: token.map(str::to_owned),
        }
    }

    /// Send a request with the app's token as a bearer header.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = &self.token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send_raw(req, body).await
    }

    /// Send a request exactly as built, no auth header added.
    pub async fn send_raw(
        &self,
        req: axum::http::request::Builder,
        body: Option<Value>,
    ) -> TestResponse {
        let req = match body {
            Some(json) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }
}
