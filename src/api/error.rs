//! Shared error handling for API endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::error;

use crate::accounts::{AccountError, MIN_PASSWORD_LENGTH};

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn internal_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn internal_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::internal_error(msg, e))
    }
}

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed to decode or validate.
    Validation {
        message: String,
        errors: BTreeMap<String, String>,
    },
    BadRequest(String),
    Unauthorized(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Log the underlying failure and hide it behind a generic 500.
    pub fn internal_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!(error = %e, "{}", context);
        Self::Internal("Internal server error".into())
    }

    pub fn invalid_payload() -> Self {
        Self::Validation {
            message: "Invalid request payload".into(),
            errors: BTreeMap::new(),
        }
    }

    pub fn validation_failed(errors: BTreeMap<String, String>) -> Self {
        Self::Validation {
            message: "Validation failed".into(),
            errors,
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::PasswordTooShort => {
                let mut errors = BTreeMap::new();
                errors.insert(
                    "password".to_string(),
                    format!(
                        "password must be at least {} characters long",
                        MIN_PASSWORD_LENGTH
                    ),
                );
                Self::validation_failed(errors)
            }
            AccountError::EmailTaken => Self::bad_request("Email already registered"),
            AccountError::InvalidCredentials => Self::unauthorized("Invalid email or password"),
            e @ (AccountError::Store(_) | AccountError::Hashing(_)) => {
                Self::internal_error("Account operation failed", e)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ValidationResponse {
    message: String,
    errors: BTreeMap<String, String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation { message, errors } => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ValidationResponse { message, errors }),
                )
                    .into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
