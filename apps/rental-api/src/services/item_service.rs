//! Owner-facing item operations.
//!
//! Ownership is checked here; occupancy is checked by the guarded
//! repository writes, inside the same transaction as the update.

use serde::Serialize;
use tracing::info;

use rentwell_core::validation::{validate_id, validate_item_changes, validate_item_draft};
use rentwell_core::{Availability, Item, ItemChanges, ItemDraft};
use rentwell_db::Database;

use super::rental_service::today;
use crate::error::{ApiError, ApiResult};

/// An item with its live availability.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub availability: Availability,
}

/// Lists a new item for `owner_id`.
pub async fn create_item(db: &Database, owner_id: &str, draft: ItemDraft) -> ApiResult<Item> {
    validate_item_draft(&draft)?;
    let item = db.items().create(owner_id, draft).await?;
    info!(item_id = %item.id, owner_id = %owner_id, "Item listed");
    Ok(item)
}

/// An item and whether it can be booked today.
pub async fn get_item(db: &Database, item_id: &str) -> ApiResult<ItemView> {
    validate_id("itemId", item_id)?;
    let item = db
        .items()
        .get_by_id(item_id)
        .await?
        .ok_or_else(|| item_not_found(item_id))?;
    let availability = db.rentals().check_availability(item_id, today()).await?;
    Ok(ItemView { item, availability })
}

/// Edits an item the caller owns, unless a rental holds it today.
pub async fn update_item(
    db: &Database,
    caller: &str,
    item_id: &str,
    changes: ItemChanges,
) -> ApiResult<Item> {
    validate_item_changes(&changes)?;
    ensure_owner(db, caller, item_id).await?;
    Ok(db.items().edit_unoccupied(item_id, today(), changes).await?)
}

/// Lists or delists an item the caller owns.
pub async fn set_item_listing(
    db: &Database,
    caller: &str,
    item_id: &str,
    listed: bool,
) -> ApiResult<Item> {
    ensure_owner(db, caller, item_id).await?;
    let item = db.items().set_listing(item_id, listed).await?;
    info!(item_id = %item_id, status = %item.status, "Item listing changed");
    Ok(item)
}

async fn ensure_owner(db: &Database, caller: &str, item_id: &str) -> ApiResult<()> {
    let item = db
        .items()
        .get_by_id(item_id)
        .await?
        .ok_or_else(|| item_not_found(item_id))?;

    if !item.is_owned_by(caller) {
        return Err(ApiError::forbidden("Only the owner can change this item"));
    }
    Ok(())
}

fn item_not_found(item_id: &str) -> ApiError {
    ApiError::not_found(format!("Item not found: {item_id}"))
}
