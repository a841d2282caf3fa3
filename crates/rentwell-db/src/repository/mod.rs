//! # Repository Module
//!
//! Database repository implementations for Rentwell.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Rental Engine (rental-api)                                            │
//! │       │                                                                 │
//! │       │  db.rentals().reserve(new_rental, today, reprice)              │
//! │       ▼                                                                 │
//! │  RentalRepository                                                      │
//! │  ├── reserve(...)            one transaction, rental + item            │
//! │  ├── apply_transition(...)   one transaction, rental + item            │
//! │  ├── find_occupying(...)                                               │
//! │  └── list_by_renter(...)                                               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Writing Both Tables Safely
//! Every write that can change an item's status follows the same shape:
//!
//! ```text
//! BEGIN
//!   1. claim the item row     UPDATE items SET version = version + 1
//!                             (first statement: takes the write lock)
//!   2. read + decide          availability, expected rental status
//!   3. write the rental
//!   4. settle the item        status recomputed from rental rows
//! COMMIT
//! ```
//!
//! The claim must be the first statement. A transaction that reads first
//! and writes later can find its snapshot stale once it wants the lock;
//! one that writes first simply waits for the lock (busy timeout) and then
//! reads current data.
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Item CRUD and guarded edits
//! - [`RentalRepository`](rental::RentalRepository) - Reservation and lifecycle
//! - [`UserRepository`](user::UserRepository) - Display names

pub mod item;
pub mod rental;
pub mod user;

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;
use rentwell_core::lifecycle::settle_item_status;
use rentwell_core::{ItemStatus, Rental};

/// Column list for `SELECT ... FROM items`.
pub(crate) const ITEM_COLUMNS: &str = "id, owner_id, title, description, category, condition, \
     location, photos, price_daily, security_deposit, status, publish_date, updated_at, version";

/// Column list for `SELECT ... FROM rentals r`.
pub(crate) const RENTAL_COLUMNS: &str = "r.id, r.item_id, r.renter_id, r.start_date, r.end_date, \
     r.days, r.price_per_day, r.total_price, r.status, r.payment_status, r.request_key, \
     r.created_at, r.updated_at";

/// SQL set matching `RentalStatus::OCCUPYING`.
pub(crate) const OCCUPYING_SQL: &str = "('confirmed', 'active')";

/// Claims an item row for the current transaction.
///
/// Returns `false` when the item does not exist.
pub(crate) async fn claim_item(conn: &mut SqliteConnection, item_id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE items SET version = version + 1 WHERE id = ?1")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Occupying rentals of an item, optionally only those ending on or after
/// `since`.
pub(crate) async fn fetch_occupying<'e, E>(
    executor: E,
    item_id: &str,
    since: Option<NaiveDate>,
) -> DbResult<Vec<Rental>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {RENTAL_COLUMNS} FROM rentals r \
         WHERE r.item_id = ?1 AND r.status IN {OCCUPYING_SQL} \
           AND (?2 IS NULL OR r.end_date >= ?2)"
    );

    let rentals = sqlx::query_as::<_, Rental>(&sql)
        .bind(item_id)
        .bind(since)
        .fetch_all(executor)
        .await?;

    Ok(rentals)
}

/// Recomputes an item's status from its rentals and writes it back.
pub(crate) async fn settle_item(conn: &mut SqliteConnection, item_id: &str) -> DbResult<ItemStatus> {
    let current: ItemStatus = sqlx::query_scalar("SELECT status FROM items WHERE id = ?1")
        .bind(item_id)
        .fetch_one(&mut *conn)
        .await?;

    let occupied_sql = format!(
        "SELECT EXISTS (SELECT 1 FROM rentals WHERE item_id = ?1 AND status IN {OCCUPYING_SQL})"
    );
    let any_occupying: bool = sqlx::query_scalar(&occupied_sql)
        .bind(item_id)
        .fetch_one(&mut *conn)
        .await?;

    let settled = settle_item_status(current, any_occupying);
    if settled != current {
        sqlx::query("UPDATE items SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(settled)
            .bind(Utc::now())
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
    }

    debug!(item_id = %item_id, from = %current, to = %settled, "Item status settled");
    Ok(settled)
}
