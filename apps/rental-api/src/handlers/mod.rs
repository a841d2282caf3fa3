//! HTTP handlers.

pub mod health;
pub mod items;
pub mod rentals;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::{ApiError, ApiResult};

/// Unwraps a JSON body, turning extractor rejections into a 400 body
/// in the API's error format.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}
