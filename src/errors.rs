use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::token::TokenError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("brand mismatch")]
    BrandMismatch,

    #[error("login brand does not match stored brand")]
    LoginBrandMismatch,

    #[error("token rejected: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("dataset '{dataset}' not found for brand '{brand}'")]
    DatasetNotFound { brand: String, dataset: String },

    #[error("dataset root is not available: {0}")]
    DatasetStoreUnavailable(String),

    #[error("dataset '{dataset}' is corrupt: {reason}")]
    DatasetCorrupt { dataset: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            // One message for unknown identity, wrong password and wrong
            // login brand. Nothing here may reveal which check failed.
            AppError::InvalidCredentials | AppError::LoginBrandMismatch => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_credentials",
                "invalid credentials".to_string(),
            ),
            AppError::BrandMismatch => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "brand_mismatch",
                "brand mismatch - access denied".to_string(),
            ),
            // Expiry, bad signature, malformed and missing-claim failures
            // all collapse to this one externally observable outcome.
            AppError::InvalidToken(e) => {
                tracing::debug!("token rejected: {}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    "authentication_error",
                    "invalid_token",
                    "invalid or expired token".to_string(),
                )
            }
            AppError::DatasetNotFound { brand, dataset } => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "dataset_not_found",
                format!("data file not found for brand '{}': {}", brand, dataset),
            ),
            AppError::DatasetStoreUnavailable(reason) => {
                tracing::error!("dataset store unavailable: {}", reason);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "infrastructure_error",
                    "dataset_store_unavailable",
                    "data directory not configured".to_string(),
                )
            }
            AppError::DatasetCorrupt { dataset, reason } => {
                tracing::error!("dataset '{}' corrupt: {}", dataset, reason);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "data_error",
                    "dataset_corrupt",
                    format!("error reading dataset '{}'", dataset),
                )
            }
            AppError::Database(e) => {
                tracing::error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
