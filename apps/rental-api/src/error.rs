//! Error types for the Rental API.
//!
//! ## Status Mapping
//! ```text
//! ValidationError / CoreError::Validation   → 400 VALIDATION_ERROR
//! missing or bad bearer token               → 401 UNAUTHORIZED
//! caller does not own the item              → 403 FORBIDDEN
//! DbError::NotFound / hidden rental         → 404 NOT_FOUND
//! item occupied / delisted                  → 409 CONFLICT (+ currentRental)
//! CoreError::InvalidTransition              → 409 INVALID_TRANSITION
//! anything else                             → 500 INTERNAL_ERROR
//! ```
//!
//! 500 bodies carry a generic message; the cause is logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use rentwell_core::{CoreError, Rental, ValidationError};
use rentwell_db::{DbError, ItemGuardError, ReserveError};

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    InvalidTransition,
    InternalError,
}

impl ErrorCode {
    pub const fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict | ErrorCode::InvalidTransition => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What an HTTP client sees when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// The rental holding the item, on item conflicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rental: Option<Rental>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            current_rental: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>, current_rental: Option<Rental>) -> Self {
        ApiError {
            code: ErrorCode::Conflict,
            message: message.into(),
            current_rental,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self.code {
            ErrorCode::InternalError => {
                error!(message = %self.message, "Request failed");
                ApiError::internal("Internal server error")
            }
            ErrorCode::Conflict | ErrorCode::InvalidTransition => {
                warn!(
                    code = ?self.code,
                    current_rental = ?self.current_rental.as_ref().map(|r| &r.id),
                    message = %self.message,
                    "Request conflicted"
                );
                self
            }
            _ => self,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransition { .. } => {
                ApiError::new(ErrorCode::InvalidTransition, err.to_string())
            }
            CoreError::InvalidPeriod { .. } => ApiError::validation(err.to_string()),
            CoreError::Validation(inner) => inner.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<ReserveError> for ApiError {
    fn from(err: ReserveError) -> Self {
        match err {
            ReserveError::ItemNotFound(_) => ApiError::not_found(err.to_string()),
            ReserveError::ItemUnlisted(_) => ApiError::conflict(err.to_string(), None),
            ReserveError::Occupied { ref current, .. } => {
                let current = Some((**current).clone());
                ApiError::conflict(err.to_string(), current)
            }
            ReserveError::Db(inner) => inner.into(),
        }
    }
}

impl From<ItemGuardError> for ApiError {
    fn from(err: ItemGuardError) -> Self {
        match err {
            ItemGuardError::NotFound(_) => ApiError::not_found(err.to_string()),
            ItemGuardError::Occupied { ref current, .. } => {
                let current = Some((**current).clone());
                ApiError::conflict(err.to_string(), current)
            }
            ItemGuardError::Db(inner) => inner.into(),
        }
    }
}
