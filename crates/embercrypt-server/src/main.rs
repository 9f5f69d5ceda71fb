//! Embercrypt server entry point.
//!
//! Loads configuration, opens the storage backend, builds the vault password
//! service behind the encryption barrier, and serves the Axum router until
//! SIGINT or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use embercrypt_core::crypto::EncryptionKey;
use embercrypt_core::service::{BarrierPasswordService, VaultPasswordService};
use embercrypt_storage::{MemoryBackend, StorageBackend};

use embercrypt_server::config::{ServerConfig, StorageBackendType};
use embercrypt_server::routes;
use embercrypt_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    config.check_auth().context("refusing to start")?;
    config.check_master_key().context("refusing to start")?;
    if config.api_token.is_none() {
        warn!("EMBERCRYPT_ALLOW_ANONYMOUS is set: vault password routes accept unauthenticated requests");
    }

    info!(storage = ?config.storage_backend, "Embercrypt starting");

    let state = build_app_state(&config)?;
    let app = routes::build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Embercrypt server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Embercrypt server stopped");
    Ok(())
}

fn open_storage(config: &ServerConfig) -> anyhow::Result<Arc<dyn StorageBackend>> {
    match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (data will not persist)");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "redb-backend")]
        StorageBackendType::Redb { path } => {
            info!(path = %path, "using redb storage");
            Ok(Arc::new(
                embercrypt_storage::RedbBackend::open(path)
                    .context("failed to open redb storage")?,
            ))
        }
        #[cfg(not(feature = "redb-backend"))]
        StorageBackendType::Redb { .. } => {
            anyhow::bail!("redb backend requested but feature 'redb-backend' is not enabled");
        }
    }
}

/// Build the shared state: storage, barrier-backed service, auth token.
fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let storage = open_storage(config)?;

    let master_key = if let Some(key) = &config.master_key {
        key.clone()
    } else {
        // Only reachable with in-memory storage.
        info!("EMBERCRYPT_MASTER_KEY is not set: using an ephemeral key");
        EncryptionKey::generate()
    };

    let service: Arc<dyn VaultPasswordService> = Arc::new(
        BarrierPasswordService::with_master_key(storage, &master_key)
            .context("failed to derive vault password key")?,
    );

    Ok(Arc::new(
        AppState::new(service, config.api_token.clone())
            .with_max_body_bytes(config.max_body_bytes),
    ))
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
