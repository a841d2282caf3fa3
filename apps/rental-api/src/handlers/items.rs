//! `/items` routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use rentwell_core::{Item, ItemChanges, ItemDraft, ValidationError};

use super::json_body;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::item_service::{self, ItemView};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListingBody {
    pub listed: Option<bool>,
}

/// `POST /items`
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<ItemDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let draft = json_body(payload)?;
    let item = item_service::create_item(&state.db, &user.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /items/{id}`
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ItemView>> {
    Ok(Json(item_service::get_item(&state.db, &id).await?))
}

/// `PUT /items/{id}`
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ItemChanges>, JsonRejection>,
) -> ApiResult<Json<Item>> {
    let changes = json_body(payload)?;
    let item = item_service::update_item(&state.db, &user.user_id, &id, changes).await?;
    Ok(Json(item))
}

/// `PUT /items/{id}/listing`
pub async fn set_listing(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ListingBody>, JsonRejection>,
) -> ApiResult<Json<Item>> {
    let listed = json_body(payload)?
        .listed
        .ok_or_else(|| ValidationError::required("listed"))?;
    let item = item_service::set_item_listing(&state.db, &user.user_id, &id, listed).await?;
    Ok(Json(item))
}
