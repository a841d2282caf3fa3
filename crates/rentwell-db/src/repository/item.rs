//! # Item Repository
//!
//! Persistence for item listings.
//!
//! The plain methods (`get_by_id`, `insert`, `update_details`,
//! `update_status`, `list_by_owner`) are dumb persistence: they check neither
//! ownership nor occupancy. The guarded methods (`edit_unoccupied`,
//! `set_listing`) run the occupancy check and the write in one transaction;
//! ownership is still the caller's job.

use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::{claim_item, fetch_occupying, ITEM_COLUMNS};
use crate::error::{DbError, DbResult};
use rentwell_core::availability::select_current_rental;
use rentwell_core::{Availability, Item, ItemChanges, ItemDraft, ItemStatus, Rental};

/// Why a guarded item write did not happen.
#[derive(Debug, Error)]
pub enum ItemGuardError {
    #[error("Item not found: {0}")]
    NotFound(String),

    /// A rental holds the item.
    #[error("Item {item_id} is held by rental {}", .current.id)]
    Occupied {
        item_id: String,
        current: Box<Rental>,
    },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for ItemGuardError {
    fn from(err: sqlx::Error) -> Self {
        ItemGuardError::Db(err.into())
    }
}

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists an owner's items, newest first.
    pub async fn list_by_owner(&self, owner_id: &str) -> DbResult<Vec<Item>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE owner_id = ?1 \
             ORDER BY publish_date DESC, id DESC"
        );

        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Inserts an item as given.
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, owner_id = %item.owner_id, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, owner_id, title, description, category, condition, location,
                photos, price_daily, security_deposit, status, publish_date,
                updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&item.id)
        .bind(&item.owner_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.condition)
        .bind(&item.location)
        .bind(Json(&item.photos))
        .bind(item.price_daily)
        .bind(item.security_deposit)
        .bind(item.status)
        .bind(item.publish_date)
        .bind(item.updated_at)
        .bind(item.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Creates a new `available` listing for `owner_id`.
    pub async fn create(&self, owner_id: &str, draft: ItemDraft) -> DbResult<Item> {
        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            category: draft.category,
            condition: draft.condition,
            location: draft.location,
            photos: draft.photos,
            price_daily: draft.price_daily,
            security_deposit: draft.security_deposit,
            status: ItemStatus::Available,
            publish_date: now,
            updated_at: now,
            version: 0,
        };

        self.insert(&item).await?;
        info!(id = %item.id, owner_id = %owner_id, "Item listed");
        Ok(item)
    }

    /// Writes an item's descriptive fields and prices.
    ///
    /// `status`, `owner_id` and `publish_date` are left untouched.
    pub async fn update_details(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, "Updating item details");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                title = ?2,
                description = ?3,
                category = ?4,
                condition = ?5,
                location = ?6,
                photos = ?7,
                price_daily = ?8,
                security_deposit = ?9,
                updated_at = ?10,
                version = version + 1
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.condition)
        .bind(&item.location)
        .bind(Json(&item.photos))
        .bind(item.price_daily)
        .bind(item.security_deposit)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    /// Overwrites an item's status.
    ///
    /// Bypasses the status invariant. The rental engine never calls this;
    /// rental writes settle the status inside their own transactions.
    pub async fn update_status(&self, id: &str, status: ItemStatus) -> DbResult<()> {
        debug!(id = %id, status = %status, "Updating item status");

        let result = sqlx::query(
            "UPDATE items SET status = ?2, updated_at = ?3, version = version + 1 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Applies `changes` unless a rental holds the item on `today`.
    pub async fn edit_unoccupied(
        &self,
        id: &str,
        today: NaiveDate,
        changes: ItemChanges,
    ) -> Result<Item, ItemGuardError> {
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        if !claim_item(&mut tx, id).await? {
            return Err(ItemGuardError::NotFound(id.to_string()));
        }

        let blocking = fetch_occupying(&mut *tx, id, Some(today)).await?;
        if let Availability {
            current_rental: Some(current),
            ..
        } = Availability::from_candidates(blocking, today)
        {
            tx.rollback().await.map_err(DbError::transaction)?;
            debug!(id = %id, rental_id = %current.id, "Edit refused, item occupied");
            return Err(ItemGuardError::Occupied {
                item_id: id.to_string(),
                current: Box::new(current),
            });
        }

        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        let mut item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        changes.apply_to(&mut item);
        item.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE items SET
                title = ?2, description = ?3, category = ?4, condition = ?5,
                location = ?6, photos = ?7, price_daily = ?8, security_deposit = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.condition)
        .bind(&item.location)
        .bind(Json(&item.photos))
        .bind(item.price_daily)
        .bind(item.security_deposit)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(id = %id, version = item.version, "Item updated");
        Ok(item)
    }

    /// Lists (`available`) or delists (`unavailable`) an item.
    ///
    /// Refused while any occupying rental exists, expired or not: the item
    /// must stay `rented` until that rental is closed.
    pub async fn set_listing(&self, id: &str, listed: bool) -> Result<Item, ItemGuardError> {
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        if !claim_item(&mut tx, id).await? {
            return Err(ItemGuardError::NotFound(id.to_string()));
        }

        let occupying = fetch_occupying(&mut *tx, id, None).await?;
        if let Some(current) = select_current_rental(occupying, NaiveDate::MIN) {
            tx.rollback().await.map_err(DbError::transaction)?;
            debug!(id = %id, rental_id = %current.id, "Listing change refused, item occupied");
            return Err(ItemGuardError::Occupied {
                item_id: id.to_string(),
                current: Box::new(current),
            });
        }

        let status = if listed {
            ItemStatus::Available
        } else {
            ItemStatus::Unavailable
        };

        sqlx::query("UPDATE items SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(id = %id, status = %status, "Item listing changed");
        Ok(item)
    }
}

// =============================================================================
// Tests
// =============================================================================
