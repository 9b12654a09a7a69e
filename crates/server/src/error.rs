//! Error type shared by every handler.
//!
//! Typed [`ModDbError`]s raised by the services are downcast out of the
//! `anyhow` chain and mapped to client-facing statuses. Anything else is
//! logged in full and answered with a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::{ErrorCode, ModDbError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A 400 carrying an application error code.
    #[error("rejected: {0}")]
    Code(ErrorCode),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Code(code) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "errorCode": code }))).into_response()
            }
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_owned()),
            ApiError::NotImplemented(m) => (StatusCode::NOT_IMPLEMENTED, m),
            ApiError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ModDbError> for ApiError {
    fn from(e: ModDbError) -> Self {
        match e {
            ModDbError::ModNotFound(alias) => ApiError::NotFound(format!("could not find mod {}", alias)),
            ModDbError::Account(code) => ApiError::Code(code),
            ModDbError::LegacyModeEnabled => ApiError::Code(ErrorCode::LegacyApiModeEnabled),
            ModDbError::NotImplemented(what) => ApiError::NotImplemented(what.to_owned()),
            ModDbError::Unauthorized => ApiError::Unauthorized,
            ModDbError::Forbidden => ApiError::Forbidden,
            other @ ModDbError::LegacyStatus(_) => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<ModDbError>() {
            Ok(typed) => typed.into(),
            Err(e) => {
                error!(error = ?e, "unhandled service error");
                ApiError::Internal(e.to_string())
            }
        }
    }
}
