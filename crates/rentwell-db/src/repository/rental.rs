//! # Rental Repository
//!
//! Database operations for rentals, including the two transactions that keep
//! `items.status` consistent with rental rows.
//!
//! ## Rental Lifecycle in the Database
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Rental Writes                                     │
//! │                                                                         │
//! │  1. RESERVE                                                            │
//! │     └── reserve() → claim item → replay by key? → item listed?         │
//! │                   → blocking rentals? → insert (confirmed, paid)       │
//! │                   → settle item (rented)                                │
//! │                                                                         │
//! │  2. TRANSITION (pickup / return / complete / cancel)                   │
//! │     └── apply_transition(id, expected, new)                            │
//! │                   → claim item → compare-and-set rental status          │
//! │                   → settle item (rented or released)                    │
//! │                                                                         │
//! │  Rentals are never deleted.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::{claim_item, fetch_occupying, settle_item, ITEM_COLUMNS, RENTAL_COLUMNS};
use crate::error::{DbError, DbResult};
use rentwell_core::pricing::RentalTerms;
use rentwell_core::{
    Availability, Item, ItemStatus, PaymentStatus, Rental, RentalDetail, RentalStatus,
};

// =============================================================================
// Reserve Types
// =============================================================================

/// A rental about to be reserved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRental {
    pub item_id: String,
    pub renter_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Terms as the client sent them.
    pub terms: RentalTerms,
    /// Client idempotency key.
    pub request_key: Option<String>,
}

/// A reservation that went through.
#[derive(Debug, Clone, PartialEq)]
pub enum ReserveOutcome {
    /// A new rental was inserted.
    Created(Rental),
    /// The renter already used this request key; nothing was written.
    Replayed(Rental),
}

impl ReserveOutcome {
    pub fn rental(&self) -> &Rental {
        match self {
            ReserveOutcome::Created(rental) | ReserveOutcome::Replayed(rental) => rental,
        }
    }

    pub fn into_rental(self) -> Rental {
        match self {
            ReserveOutcome::Created(rental) | ReserveOutcome::Replayed(rental) => rental,
        }
    }
}

/// A reservation that did not go through.
#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The owner took the item off the market.
    #[error("Item {0} is not available for rent")]
    ItemUnlisted(String),

    /// Another rental holds the item.
    #[error("Item {item_id} is already rented")]
    Occupied {
        item_id: String,
        current: Box<Rental>,
    },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for ReserveError {
    fn from(err: sqlx::Error) -> Self {
        ReserveError::Db(err.into())
    }
}

// =============================================================================
// Transition Types
// =============================================================================

/// Result of a compare-and-set on a rental's status.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The rental moved; the item status was settled alongside.
    Applied {
        rental: Rental,
        item_status: ItemStatus,
    },
    /// The rental was no longer in the expected status. Nothing was written.
    Stale { current: RentalStatus },
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for rental database operations.
#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
}

impl RentalRepository {
    /// Creates a new RentalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RentalRepository { pool }
    }

    /// Gets a rental by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Rental>> {
        let sql = format!("SELECT {RENTAL_COLUMNS} FROM rentals r WHERE r.id = ?1");

        let rental = sqlx::query_as::<_, Rental>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rental)
    }

    /// Gets a rental with item and user names.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<RentalDetail>> {
        let sql = format!("{} WHERE r.id = ?1", detail_select());

        let detail = sqlx::query_as::<_, RentalDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(detail)
    }

    /// A renter's own rentals, newest first.
    pub async fn list_by_renter(&self, renter_id: &str) -> DbResult<Vec<RentalDetail>> {
        let sql = format!(
            "{} WHERE r.renter_id = ?1 ORDER BY r.created_at DESC, r.id DESC",
            detail_select()
        );

        let rentals = sqlx::query_as::<_, RentalDetail>(&sql)
            .bind(renter_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rentals)
    }

    /// Rentals of an owner's items by other users, newest first.
    pub async fn list_for_owner(&self, owner_id: &str) -> DbResult<Vec<RentalDetail>> {
        let sql = format!(
            "{} WHERE i.owner_id = ?1 AND r.renter_id <> ?1 \
             ORDER BY r.created_at DESC, r.id DESC",
            detail_select()
        );

        let rentals = sqlx::query_as::<_, RentalDetail>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rentals)
    }

    /// Finds the rental a renter created with `request_key`.
    pub async fn find_by_request_key(
        &self,
        renter_id: &str,
        request_key: &str,
    ) -> DbResult<Option<Rental>> {
        let sql = format!(
            "SELECT {RENTAL_COLUMNS} FROM rentals r WHERE r.renter_id = ?1 AND r.request_key = ?2"
        );

        let rental = sqlx::query_as::<_, Rental>(&sql)
            .bind(renter_id)
            .bind(request_key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rental)
    }

    /// Occupying rentals of an item. With `since`, only those ending on or
    /// after that date.
    pub async fn find_occupying(
        &self,
        item_id: &str,
        since: Option<NaiveDate>,
    ) -> DbResult<Vec<Rental>> {
        fetch_occupying(&self.pool, item_id, since).await
    }

    /// Availability of an item on `today`.
    pub async fn check_availability(
        &self,
        item_id: &str,
        today: NaiveDate,
    ) -> DbResult<Availability> {
        let candidates = self.find_occupying(item_id, Some(today)).await?;
        Ok(Availability::from_candidates(candidates, today))
    }

    /// Reserves an item for a renter, atomically.
    ///
    /// ## Steps (one transaction)
    /// 1. Claim the item row (`ItemNotFound` if missing)
    /// 2. With a request key already used by this renter: return that rental
    /// 3. `ItemUnlisted` if the owner delisted the item
    /// 4. `Occupied` if a rental blocks the item on `today`
    /// 5. Price with `reprice(item, client_terms)`
    /// 6. Insert the rental as `confirmed` + `paid`
    /// 7. Settle the item status (`rented`)
    ///
    /// Two reservations for the same item queue on step 1, so the second
    /// one sees the first one's rental at step 4.
    pub async fn reserve<F>(
        &self,
        new: NewRental,
        today: NaiveDate,
        reprice: F,
    ) -> Result<ReserveOutcome, ReserveError>
    where
        F: FnOnce(&Item, RentalTerms) -> RentalTerms + Send,
    {
        debug!(item_id = %new.item_id, renter_id = %new.renter_id, "Reserving item");

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        if !claim_item(&mut tx, &new.item_id).await? {
            return Err(ReserveError::ItemNotFound(new.item_id));
        }

        if let Some(key) = &new.request_key {
            let sql = format!(
                "SELECT {RENTAL_COLUMNS} FROM rentals r \
                 WHERE r.renter_id = ?1 AND r.request_key = ?2"
            );
            let existing = sqlx::query_as::<_, Rental>(&sql)
                .bind(&new.renter_id)
                .bind(key)
                .fetch_optional(&mut *tx)
                .await?;

            if let Some(rental) = existing {
                tx.rollback().await.map_err(DbError::transaction)?;
                debug!(rental_id = %rental.id, "Request key replayed");
                return Ok(ReserveOutcome::Replayed(rental));
            }
        }

        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(&new.item_id)
            .fetch_one(&mut *tx)
            .await?;

        if item.status == ItemStatus::Unavailable {
            tx.rollback().await.map_err(DbError::transaction)?;
            return Err(ReserveError::ItemUnlisted(new.item_id));
        }

        let blocking = fetch_occupying(&mut *tx, &new.item_id, Some(today)).await?;
        if let Some(current) = Availability::from_candidates(blocking, today).current_rental {
            tx.rollback().await.map_err(DbError::transaction)?;
            debug!(item_id = %new.item_id, current = %current.id, "Item occupied");
            return Err(ReserveError::Occupied {
                item_id: new.item_id,
                current: Box::new(current),
            });
        }

        let terms = reprice(&item, new.terms);
        let now = Utc::now();
        let rental = Rental {
            id: Uuid::new_v4().to_string(),
            item_id: new.item_id,
            renter_id: new.renter_id,
            start_date: new.start_date,
            end_date: new.end_date,
            days: terms.days,
            price_per_day: terms.price_per_day,
            total_price: terms.total_price,
            status: RentalStatus::Confirmed,
            payment_status: PaymentStatus::Paid,
            request_key: new.request_key,
            created_at: now,
            updated_at: now,
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO rentals (
                id, item_id, renter_id, start_date, end_date, days,
                price_per_day, total_price, status, payment_status,
                request_key, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&rental.id)
        .bind(&rental.item_id)
        .bind(&rental.renter_id)
        .bind(rental.start_date)
        .bind(rental.end_date)
        .bind(rental.days)
        .bind(rental.price_per_day)
        .bind(rental.total_price)
        .bind(rental.status)
        .bind(rental.payment_status)
        .bind(&rental.request_key)
        .bind(rental.created_at)
        .bind(rental.updated_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            // The same key was committed for another item in the meantime.
            Err(err) => match (DbError::from(err), &rental.request_key) {
                (DbError::UniqueViolation { .. }, Some(key)) => {
                    tx.rollback().await.map_err(DbError::transaction)?;
                    let existing = self
                        .find_by_request_key(&rental.renter_id, key)
                        .await?
                        .ok_or_else(|| DbError::not_found("Rental (request key)", key.as_str()))?;
                    return Ok(ReserveOutcome::Replayed(existing));
                }
                (err, _) => return Err(err.into()),
            },
        }

        let item_status = settle_item(&mut tx, &rental.item_id).await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            rental_id = %rental.id,
            item_id = %rental.item_id,
            renter_id = %rental.renter_id,
            item_status = %item_status,
            "Rental reserved"
        );

        Ok(ReserveOutcome::Created(rental))
    }

    /// Moves a rental from `expected` to `new`, atomically with its item.
    ///
    /// ## Steps (one transaction)
    /// 1. Claim the rental's item row (`NotFound` if the rental is missing)
    /// 2. Update the rental only if its status is still `expected`
    /// 3. Settle the item status from the remaining rentals
    ///
    /// A rental that moved since the caller read it yields
    /// [`TransitionOutcome::Stale`] and writes nothing.
    pub async fn apply_transition(
        &self,
        rental_id: &str,
        expected: RentalStatus,
        new: RentalStatus,
    ) -> DbResult<TransitionOutcome> {
        debug!(rental_id = %rental_id, from = %expected, to = %new, "Applying transition");

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let claimed = sqlx::query(
            "UPDATE items SET version = version + 1 \
             WHERE id = (SELECT item_id FROM rentals WHERE id = ?1)",
        )
        .bind(rental_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(DbError::not_found("Rental", rental_id));
        }

        let updated = sqlx::query(
            "UPDATE rentals SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(new)
        .bind(Utc::now())
        .bind(rental_id)
        .bind(expected)
        .execute(&mut *tx)
        .await?;

        let sql = format!("SELECT {RENTAL_COLUMNS} FROM rentals r WHERE r.id = ?1");

        if updated.rows_affected() == 0 {
            let current = sqlx::query_as::<_, Rental>(&sql)
                .bind(rental_id)
                .fetch_one(&mut *tx)
                .await?
                .status;
            tx.rollback().await.map_err(DbError::transaction)?;
            debug!(rental_id = %rental_id, expected = %expected, current = %current, "Stale transition");
            return Ok(TransitionOutcome::Stale { current });
        }

        let rental = sqlx::query_as::<_, Rental>(&sql)
            .bind(rental_id)
            .fetch_one(&mut *tx)
            .await?;

        let item_status = settle_item(&mut tx, &rental.item_id).await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            rental_id = %rental_id,
            item_id = %rental.item_id,
            from = %expected,
            to = %new,
            item_status = %item_status,
            "Rental transition committed"
        );

        Ok(TransitionOutcome::Applied {
            rental,
            item_status,
        })
    }
}

/// `SELECT` joining a rental with its item and both users.
fn detail_select() -> String {
    format!(
        "SELECT {RENTAL_COLUMNS}, \
                i.title AS item_title, \
                json_extract(i.photos, '$[0]') AS item_photo, \
                ru.name AS renter_name, \
                i.owner_id AS owner_id, \
                ou.name AS owner_name \
         FROM rentals r \
         JOIN items i ON i.id = r.item_id \
         LEFT JOIN users ru ON ru.id = r.renter_id \
         LEFT JOIN users ou ON ou.id = i.owner_id"
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use rentwell_core::{ItemDraft, Money};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn keep(_: &Item, terms: RentalTerms) -> RentalTerms {
        terms
    }

    async fn setup() -> (Database, Item) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert("owner", "Olga Owner", "olga@example.com").await.unwrap();
        db.users().insert("bob", "Bob Renter", "bob@example.com").await.unwrap();

        let item = db
            .items()
            .create(
                "owner",
                ItemDraft {
                    title: "Camera".to_string(),
                    description: None,
                    category: None,
                    condition: None,
                    location: None,
                    photos: vec!["https://img.example/cam.jpg".to_string()],
                    price_daily: Money::from_cents(2500),
                    security_deposit: Money::from_cents(10000),
                },
            )
            .await
            .unwrap();
        (db, item)
    }

    fn new_rental(item_id: &str, renter: &str, key: Option<&str>) -> NewRental {
        NewRental {
            item_id: item_id.to_string(),
            renter_id: renter.to_string(),
            start_date: date(1),
            end_date: date(3),
            terms: RentalTerms {
                days: 3,
                price_per_day: Money::from_cents(2500),
                total_price: Money::from_cents(7500),
            },
            request_key: key.map(str::to_string),
        }
    }

    async fn item_status(db: &Database, id: &str) -> ItemStatus {
        db.items().get_by_id(id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_reserve_marks_item_rented() {
        let (db, item) = setup().await;

        let outcome = db
            .rentals()
            .reserve(new_rental(&item.id, "bob", None), date(1), keep)
            .await
            .unwrap();

        let rental = match outcome {
            ReserveOutcome::Created(rental) => rental,
            other => panic!("expected Created, got {other:?}"),
        };
        assert_eq!(rental.status, RentalStatus::Confirmed);
        assert_eq!(rental.payment_status, PaymentStatus::Paid);
        assert_eq!(item_status(&db, &item.id).await, ItemStatus::Rented);

        let stored = db.rentals().get_by_id(&rental.id).await.unwrap().unwrap();
        assert_eq!(stored, rental);
    }

    #[tokio::test]
    async fn test_second_reserve_conflicts_with_current_rental() {
        let (db, item) = setup().await;
        let first = db
            .rentals()
            .reserve(new_rental(&item.id, "bob", None), date(1), keep)
            .await
            .unwrap()
            .into_rental();

        let err = db
            .rentals()
            .reserve(new_rental(&item.id, "carol", None), date(1), keep)
            .await
            .unwrap_err();

        match err {
            ReserveError::Occupied { current, .. } => assert_eq!(current.id, first.id),
            other => panic!("expected Occupied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reserve_missing_and_unlisted_items() {
        let (db, item) = setup().await;

        let err = db
            .rentals()
            .reserve(new_rental("nope", "bob", None), date(1), keep)
            .await
            .unwrap_err();
        assert!(matches!(err, ReserveError::ItemNotFound(_)));

        db.items().set_listing(&item.id, false).await.unwrap();
        let err = db
            .rentals()
            .reserve(new_rental(&item.id, "bob", None), date(1), keep)
            .await
            .unwrap_err();
        assert!(matches!(err, ReserveError::ItemUnlisted(_)));
        assert_eq!(item_status(&db, &item.id).await, ItemStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_request_key_replays() {
        let (db, item) = setup().await;
        let repo = db.rentals();

        let first = repo
            .reserve(new_rental(&item.id, "bob", Some("k-1")), date(1), keep)
            .await
            .unwrap();
        let again = repo
            .reserve(new_rental(&item.id, "bob", Some("k-1")), date(1), keep)
            .await
            .unwrap();

        assert!(matches!(first, ReserveOutcome::Created(_)));
        assert!(matches!(again, ReserveOutcome::Replayed(_)));
        assert_eq!(first.rental().id, again.rental().id);
        assert_eq!(repo.list_by_renter("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reprice_closure_sets_terms() {
        let (db, item) = setup().await;

        let rental = db
            .rentals()
            .reserve(new_rental(&item.id, "bob", None), date(1), |item, mut terms| {
                terms.total_price = item.price_daily.multiply_days(10);
                terms
            })
            .await
            .unwrap()
            .into_rental();

        assert_eq!(rental.total_price.cents(), 25000);
    }

    #[tokio::test]
    async fn test_transitions_release_item() {
        let (db, item) = setup().await;
        let repo = db.rentals();
        let rental = repo
            .reserve(new_rental(&item.id, "bob", None), date(1), keep)
            .await
            .unwrap()
            .into_rental();

        let outcome = repo
            .apply_transition(&rental.id, RentalStatus::Confirmed, RentalStatus::Active)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            TransitionOutcome::Applied { item_status: ItemStatus::Rented, .. }
        ));

        let outcome = repo
            .apply_transition(&rental.id, RentalStatus::Active, RentalStatus::Completed)
            .await
            .unwrap();
        match outcome {
            TransitionOutcome::Applied { rental, item_status } => {
                assert_eq!(rental.status, RentalStatus::Completed);
                assert_eq!(item_status, ItemStatus::Available);
            }
            other => panic!("expected Applied, got {other:?}"),
        }
        assert_eq!(item_status(&db, &item.id).await, ItemStatus::Available);
    }

    #[tokio::test]
    async fn test_stale_transition_writes_nothing() {
        let (db, item) = setup().await;
        let repo = db.rentals();
        let rental = repo
            .reserve(new_rental(&item.id, "bob", None), date(1), keep)
            .await
            .unwrap()
            .into_rental();

        let outcome = repo
            .apply_transition(&rental.id, RentalStatus::Active, RentalStatus::Completed)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Stale {
                current: RentalStatus::Confirmed
            }
        );
        assert_eq!(item_status(&db, &item.id).await, ItemStatus::Rented);

        assert!(matches!(
            repo.apply_transition("missing", RentalStatus::Confirmed, RentalStatus::Active)
                .await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_expired_rental_does_not_block() {
        let (db, item) = setup().await;
        let repo = db.rentals();
        repo.reserve(new_rental(&item.id, "bob", None), date(1), keep)
            .await
            .unwrap();

        // Rental ends on the 3rd; on the 4th nobody holds the item.
        let availability = repo.check_availability(&item.id, date(4)).await.unwrap();
        assert!(availability.available);
        assert!(repo.check_availability(&item.id, date(3)).await.unwrap().current_rental.is_some());

        let second = repo
            .reserve(new_rental(&item.id, "carol", None), date(4), keep)
            .await;
        assert!(second.is_ok());
        assert_eq!(item_status(&db, &item.id).await, ItemStatus::Rented);
    }

    #[tokio::test]
    async fn test_detail_and_lists() {
        let (db, item) = setup().await;
        let repo = db.rentals();
        let rental = repo
            .reserve(new_rental(&item.id, "bob", None), date(1), keep)
            .await
            .unwrap()
            .into_rental();

        let detail = repo.get_detail(&rental.id).await.unwrap().unwrap();
        assert_eq!(detail.item_title, "Camera");
        assert_eq!(detail.item_photo.as_deref(), Some("https://img.example/cam.jpg"));
        assert_eq!(detail.renter_name.as_deref(), Some("Bob Renter"));
        assert_eq!(detail.owner_id, "owner");
        assert_eq!(detail.owner_name.as_deref(), Some("Olga Owner"));

        assert_eq!(repo.list_by_renter("bob").await.unwrap().len(), 1);
        assert_eq!(repo.list_for_owner("owner").await.unwrap().len(), 1);
        assert!(repo.list_for_owner("bob").await.unwrap().is_empty());
        assert!(repo.get_detail("missing").await.unwrap().is_none());
    }
}
