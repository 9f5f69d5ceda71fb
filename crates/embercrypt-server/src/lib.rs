//! Embercrypt HTTP server.
//!
//! Wires the vault password service into an Axum router: the resource API
//! under `/api/v1/vaultpassword`, its OpenAPI document, and a health check.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
