//! Server configuration.
//!
//! Everything comes from `EMBERCRYPT_*` environment variables with defaults
//! suitable for local development. [`ServerConfig::from_lookup`] takes the
//! variable source as a function so parsing can be tested without touching
//! the process environment.

use std::net::SocketAddr;

use embercrypt_core::crypto::EncryptionKey;
use embercrypt_core::error::CryptoError;

use crate::middleware::ApiToken;
use crate::state::DEFAULT_MAX_BODY_BYTES;

const DEFAULT_PORT: u16 = 8300;
const DEFAULT_STORAGE_PATH: &str = "./data/embercrypt.redb";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    pub storage_backend: StorageBackendType,
    /// Log filter used when `RUST_LOG` is unset (e.g. `info`, `debug`).
    pub log_level: String,
    /// Master key the entry key is derived from. `None` means an ephemeral
    /// key is generated at startup.
    pub master_key: Option<EncryptionKey>,
    /// Token required on the resource routes.
    pub api_token: Option<ApiToken>,
    /// Serve the resource routes without a token when none is configured.
    pub allow_anonymous: bool,
    /// Upper bound on request body size.
    pub max_body_bytes: usize,
}

/// Supported storage backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory, lost on restart.
    Memory,
    /// redb file at `path`.
    Redb { path: String },
}

/// Invalid configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("EMBERCRYPT_BIND_ADDR '{value}' is not a socket address: {reason}")]
    BindAddr { value: String, reason: String },

    #[error("PORT '{value}' is not a valid port number")]
    Port { value: String },

    #[error("EMBERCRYPT_STORAGE '{value}' is not one of: memory, redb")]
    Storage { value: String },

    #[error("EMBERCRYPT_MASTER_KEY is invalid: {0}")]
    MasterKey(#[source] CryptoError),

    #[error("{var} '{value}' is not a valid {expected}")]
    Value {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Neither a token nor explicit anonymous access was configured.
    #[error(
        "EMBERCRYPT_API_TOKEN is not set; set it or opt into unauthenticated access with EMBERCRYPT_ALLOW_ANONYMOUS=true"
    )]
    MissingApiToken,

    /// A persistent backend would outlive the ephemeral key its data is
    /// encrypted under.
    #[error(
        "EMBERCRYPT_MASTER_KEY is required with EMBERCRYPT_STORAGE=redb; generate one with `head -c 32 /dev/urandom | base64`"
    )]
    MissingMasterKey,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Variables:
    /// - `EMBERCRYPT_BIND_ADDR`: full bind address (default `127.0.0.1:8300`)
    /// - `PORT`: port on `0.0.0.0`, used when `EMBERCRYPT_BIND_ADDR` is unset
    /// - `EMBERCRYPT_STORAGE`: `memory` or `redb` (default `memory`)
    /// - `EMBERCRYPT_STORAGE_PATH`: redb file (default `./data/embercrypt.redb`)
    /// - `EMBERCRYPT_LOG_LEVEL`: log filter (default `info`)
    /// - `EMBERCRYPT_MASTER_KEY`: base64 of 32 random bytes
    /// - `EMBERCRYPT_API_TOKEN`: token for the resource routes
    /// - `EMBERCRYPT_ALLOW_ANONYMOUS`: `true`/`1` to serve without a token
    /// - `EMBERCRYPT_MAX_BODY_BYTES`: request body limit (default 65536)
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any value that does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = if let Some(addr) = var("EMBERCRYPT_BIND_ADDR") {
            addr.trim()
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::BindAddr {
                    value: addr.clone(),
                    reason: e.to_string(),
                })?
        } else if let Some(port) = var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Port { value: port.clone() })?;
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT))
        };

        let storage_backend = match var("EMBERCRYPT_STORAGE")
            .unwrap_or_else(|| "memory".to_owned())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackendType::Memory,
            "redb" => StorageBackendType::Redb {
                path: var("EMBERCRYPT_STORAGE_PATH")
                    .unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_owned()),
            },
            other => {
                return Err(ConfigError::Storage {
                    value: other.to_owned(),
                });
            }
        };

        let log_level = var("EMBERCRYPT_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let master_key = var("EMBERCRYPT_MASTER_KEY")
            .map(|encoded| EncryptionKey::from_base64(&encoded))
            .transpose()
            .map_err(ConfigError::MasterKey)?;

        let api_token = var("EMBERCRYPT_API_TOKEN").map(ApiToken::new);

        let allow_anonymous = match var("EMBERCRYPT_ALLOW_ANONYMOUS") {
            None => false,
            Some(v) => parse_bool("EMBERCRYPT_ALLOW_ANONYMOUS", &v)?,
        };

        let max_body_bytes = match var("EMBERCRYPT_MAX_BODY_BYTES") {
            None => DEFAULT_MAX_BODY_BYTES,
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Value {
                var: "EMBERCRYPT_MAX_BODY_BYTES",
                value: v.clone(),
                expected: "byte count",
            })?,
        };

        Ok(Self {
            bind_addr,
            storage_backend,
            log_level,
            master_key,
            api_token,
            allow_anonymous,
            max_body_bytes,
        })
    }

    /// Refuse to run the resource routes unauthenticated by accident.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiToken`] when there is no token and
    /// anonymous access was not requested.
    pub fn check_auth(&self) -> Result<(), ConfigError> {
        if self.api_token.is_none() && !self.allow_anonymous {
            return Err(ConfigError::MissingApiToken);
        }
        Ok(())
    }

    /// Refuse to write persistent data under a key that dies with the process.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingMasterKey`] for the redb backend without
    /// `EMBERCRYPT_MASTER_KEY`.
    pub fn check_master_key(&self) -> Result<(), ConfigError> {
        match self.storage_backend {
            StorageBackendType::Redb { .. } if self.master_key.is_none() => {
                Err(ConfigError::MissingMasterKey)
            }
            _ => Ok(()),
        }
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Value {
            var,
            value: value.to_owned(),
            expected: "boolean",
        }),
    }
}
