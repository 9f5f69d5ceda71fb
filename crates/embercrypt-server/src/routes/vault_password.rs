//! Vault password routes: `/api/v1/vaultpassword`
//!
//! One handler per verb and path. Each forwards to the injected
//! [`VaultPasswordService`](embercrypt_core::service::VaultPasswordService)
//! and translates the outcome into a status code; nothing here inspects the
//! payload.
//!
//! - `GET    /api/v1/vaultpassword`       list, 200
//! - `GET    /api/v1/vaultpassword/{id}`  get, 200 / 404
//! - `POST   /api/v1/vaultpassword`       create, 201 / 409
//! - `PUT    /api/v1/vaultpassword/{id}`  replace-by-id (upsert), 200
//! - `PUT    /api/v1/vaultpassword`       update, 200 / 404
//! - `PATCH  /api/v1/vaultpassword/{id}`  partial update, 200 / 404
//! - `DELETE /api/v1/vaultpassword/{id}`  delete, 204 / 404

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use embercrypt_core::password::VaultPassword;

use crate::error::AppError;
use crate::state::AppState;

/// Collection path.
pub const BASE_PATH: &str = "/api/v1/vaultpassword";

/// Item path, `{id_password}` being the positive entry id.
pub const ITEM_PATH: &str = "/api/v1/vaultpassword/{id_password}";

/// Route table for the resource.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(BASE_PATH, get(find_all).post(create).put(update))
        .route(
            ITEM_PATH,
            get(find_by_id)
                .put(save)
                .patch(partial_update)
                .delete(delete_by_id),
        )
}

async fn find_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VaultPassword>>, AppError> {
    debug!("GET vaultpassword: find_all");
    Ok(Json(state.passwords.find_all().await?))
}

async fn find_by_id(
    State(state): State<Arc<AppState>>,
    Path(id_password): Path<i64>,
) -> Result<Json<VaultPassword>, AppError> {
    debug!(id_password, "GET vaultpassword: find_by_id");
    state
        .passwords
        .find_by_id(id_password)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VaultPassword>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1]), AppError> {
    debug!("POST vaultpassword: create");
    let created = state.passwords.create(body).await?;
    let location = format!("{BASE_PATH}/{}", created.id_password.unwrap_or_default());
    Ok((StatusCode::CREATED, [(LOCATION, location)]))
}

async fn save(
    State(state): State<Arc<AppState>>,
    Path(id_password): Path<i64>,
    Json(body): Json<VaultPassword>,
) -> Result<StatusCode, AppError> {
    debug!(id_password, "PUT vaultpassword: save");
    state.passwords.save(id_password, body).await?;
    Ok(StatusCode::OK)
}

async fn update(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VaultPassword>,
) -> Result<StatusCode, AppError> {
    debug!(id_password = ?body.id_password, "PUT vaultpassword: update");
    state.passwords.update(body).await?;
    Ok(StatusCode::OK)
}

async fn partial_update(
    State(state): State<Arc<AppState>>,
    Path(id_password): Path<i64>,
    Json(body): Json<VaultPassword>,
) -> Result<StatusCode, AppError> {
    debug!(id_password, "PATCH vaultpassword: partial_update");
    state.passwords.partial_update(id_password, body).await?;
    Ok(StatusCode::OK)
}

async fn delete_by_id(
    State(state): State<Arc<AppState>>,
    Path(id_password): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!(id_password, "DELETE vaultpassword: delete_by_id");
    state.passwords.delete_by_id(id_password).await?;
    Ok(StatusCode::NO_CONTENT)
}
