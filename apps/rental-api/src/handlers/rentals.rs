//! `/rentals` routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rentwell_core::money::{self, Money};
use rentwell_core::{Availability, BookingRequest, RentalDetail, ValidationError};

use super::json_body;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::rental_service::StatusChange;
use crate::AppState;

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY: &str = "idempotency-key";

/// `POST /rentals` body. Fields are optional here so a missing one is
/// reported by name instead of as a parse error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalBody {
    pub item_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days: Option<i64>,
    #[serde(default, with = "money::decimal::option")]
    pub price_per_day: Option<Money>,
    #[serde(default, with = "money::decimal::option")]
    pub total_price: Option<Money>,
}

impl TryFrom<CreateRentalBody> for BookingRequest {
    type Error = ValidationError;

    fn try_from(body: CreateRentalBody) -> Result<Self, Self::Error> {
        Ok(BookingRequest {
            item_id: body.item_id.ok_or_else(|| ValidationError::required("itemId"))?,
            start_date: body
                .start_date
                .ok_or_else(|| ValidationError::required("startDate"))?,
            end_date: body
                .end_date
                .ok_or_else(|| ValidationError::required("endDate"))?,
            days: body.days.ok_or_else(|| ValidationError::required("days"))?,
            price_per_day: body
                .price_per_day
                .ok_or_else(|| ValidationError::required("pricePerDay"))?,
            total_price: body
                .total_price
                .ok_or_else(|| ValidationError::required("totalPrice"))?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedBody {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct RentalList {
    pub rentals: Vec<RentalDetail>,
}

/// `POST /rentals`: 201 on a new rental, 200 when the idempotency key was
/// already used by this renter.
pub async fn create_rental(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    headers: HeaderMap,
    payload: Result<Json<CreateRentalBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedBody>)> {
    let request = BookingRequest::try_from(json_body(payload)?)?;
    let request_key = headers
        .get(IDEMPOTENCY_KEY)
        .map(|value| {
            value
                .to_str()
                .map(str::to_string)
                .map_err(|_| ValidationError::InvalidFormat {
                    field: "Idempotency-Key".to_string(),
                    reason: "must be visible ASCII".to_string(),
                })
        })
        .transpose()?;

    let created = state
        .engine
        .create_rental(&user.user_id, request, request_key)
        .await?;

    let status = if created.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(CreatedBody { id: created.id })))
}

/// `GET /rentals`: the caller's own rentals.
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<RentalList>> {
    let rentals = state.engine.list_mine(&user.user_id).await?;
    Ok(Json(RentalList { rentals }))
}

/// `GET /rentals/my-items`: rentals of the caller's items.
pub async fn list_my_items(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<RentalList>> {
    let rentals = state.engine.list_my_items(&user.user_id).await?;
    Ok(Json(RentalList { rentals }))
}

/// `GET /rentals/check/{item_id}`
pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(item_id): Path<String>,
) -> ApiResult<Json<Availability>> {
    Ok(Json(state.engine.check_availability(&item_id).await?))
}

/// `GET /rentals/{id}`
pub async fn get_rental(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<RentalDetail>> {
    Ok(Json(state.engine.get_rental(&user.user_id, &id).await?))
}

/// `PUT /rentals/{id}/pickup`
pub async fn confirm_pickup(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusChange>> {
    Ok(Json(state.engine.confirm_pickup(&user.user_id, &id).await?))
}

/// `PUT /rentals/{id}/return`
pub async fn confirm_return(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusChange>> {
    Ok(Json(state.engine.confirm_return(&user.user_id, &id).await?))
}

/// `PUT /rentals/{id}/complete`
pub async fn complete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusChange>> {
    Ok(Json(state.engine.complete(&user.user_id, &id).await?))
}

/// `DELETE /rentals/{id}`: cancels; the row is kept.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusChange>> {
    Ok(Json(state.engine.cancel(&user.user_id, &id).await?))
}
