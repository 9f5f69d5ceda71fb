//! HTTP error type for the server.
//!
//! `NotFound` and `Conflict` are the outcomes of the resource contract and
//! answer with a bare status code and an empty body. Every other variant
//! carries a JSON body with a machine-readable `error` and a `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use embercrypt_core::error::PasswordError;

/// Error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// The requested entry does not exist.
    NotFound,
    /// The write would duplicate an existing entry.
    Conflict,
    /// Client sent a request that can never succeed.
    BadRequest(String),
    /// Missing or invalid credentials.
    Unauthorized(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::NotFound => return StatusCode::NOT_FOUND.into_response(),
            Self::Conflict => return StatusCode::CONFLICT.into_response(),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Internal(msg) => {
                error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    // Storage paths and crypto details stay in the log.
                    "internal server error".to_owned(),
                )
            }
        };

        (
            status,
            axum::Json(ErrorBody {
                error: error_type,
                message,
            }),
        )
            .into_response()
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::NotFound { .. } => Self::NotFound,
            PasswordError::Conflict { existing_id } => {
                warn!(existing_id, "rejected duplicate vault password");
                Self::Conflict
            }
            PasswordError::InvalidId { .. } => Self::BadRequest(err.to_string()),
            PasswordError::Corrupt { .. }
            | PasswordError::SequenceExhausted
            | PasswordError::Barrier(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use embercrypt_core::error::{BarrierError, CryptoError};
    use http_body_util::BodyExt;

    use super::*;

    async fn body_of(resp: Response) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn contract_errors_have_empty_bodies() {
        let resp = AppError::from(PasswordError::NotFound { id: 1 }).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_of(resp).await.is_empty());

        let resp = AppError::from(PasswordError::Conflict { existing_id: 1 }).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert!(body_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn invalid_id_is_a_bad_request_with_json() {
        let resp = AppError::from(PasswordError::InvalidId { id: -1 }).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body_of(resp).await).unwrap();
        assert_eq!(json["error"], "bad_request");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err = PasswordError::Barrier(BarrierError::Crypto(CryptoError::Decryption {
            reason: "aead::Error".to_owned(),
        }));
        let resp = AppError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_slice(&body_of(resp).await).unwrap();
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "internal server error");
    }
}
