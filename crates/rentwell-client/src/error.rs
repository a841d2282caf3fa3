//! # Client Errors
//!
//! The API answers failures with `{ code, message, currentRental? }`.
//! [`ClientError::from_response`] turns status + body back into a variant.
//!
//! ```text
//! 400 VALIDATION_ERROR     → ClientError::Validation
//! 401                      → ClientError::Unauthorized
//! 403                      → ClientError::Forbidden
//! 404                      → ClientError::NotFound
//! 409 INVALID_TRANSITION   → ClientError::InvalidTransition
//! 409 (anything else)      → ClientError::Conflict { current_rental }
//! other                    → ClientError::Server
//! ```

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use rentwell_core::Rental;

/// Errors from talking to the rental API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or undecodable body.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// `ClientConfig::base_url` is not an http(s) URL.
    #[error("invalid base url: {0}")]
    BaseUrl(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not signed in: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The item is taken (or delisted, when `current_rental` is `None`).
    #[error("conflict: {message}")]
    Conflict {
        message: String,
        current_rental: Option<Box<Rental>>,
    },

    /// The rental is not in a status that allows the action.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    current_rental: Option<Rental>,
}

impl ClientError {
    /// Maps a non-success status and its raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or(ErrorBody {
            code: String::new(),
            message: body.to_string(),
            current_rental: None,
        });
        let message = parsed.message;

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::CONFLICT if parsed.code == "INVALID_TRANSITION" => {
                ClientError::InvalidTransition(message)
            }
            StatusCode::CONFLICT => ClientError::Conflict {
                message,
                current_rental: parsed.current_rental.map(Box::new),
            },
            other => ClientError::Server {
                status: other.as_u16(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_keeps_current_rental() {
        let body = r#"{
            "code": "CONFLICT",
            "message": "Item i-1 is already rented",
            "currentRental": {
                "id": "r-9", "itemId": "i-1", "renterId": "b",
                "startDate": "2026-03-01", "endDate": "2026-03-03", "days": 3,
                "pricePerDay": 25.0, "totalPrice": 75.0,
                "status": "confirmed", "paymentStatus": "paid",
                "createdAt": "2026-03-01T10:00:00Z", "updatedAt": "2026-03-01T10:00:00Z"
            }
        }"#;

        match ClientError::from_response(StatusCode::CONFLICT, body) {
            ClientError::Conflict { current_rental, .. } => {
                assert_eq!(current_rental.unwrap().id, "r-9");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_transition_code() {
        let body = r#"{"code":"INVALID_TRANSITION","message":"Rental r-1 is cancelled, cannot confirm pickup"}"#;
        assert!(matches!(
            ClientError::from_response(StatusCode::CONFLICT, body),
            ClientError::InvalidTransition(_)
        ));
    }

    #[test]
    fn test_non_json_body() {
        match ClientError::from_response(StatusCode::BAD_GATEWAY, "upstream down") {
            ClientError::Server { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
