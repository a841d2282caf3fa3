//! # Rental Engine
//!
//! Creates rentals and walks them through their lifecycle.
//!
//! ```text
//!            create
//!              │
//!              ▼
//!  pending ─► confirmed ──pickup──► active ──return/complete──► completed
//!     │           │                              ▲
//!     │           └──────────return/complete─────┘
//!     └───cancel──┴──cancel──► cancelled
//! ```
//!
//! Every write goes through one repository call that runs in a single
//! transaction with the item, so `items.status` never drifts from the
//! rental rows. This service adds the parts the database cannot know:
//! who is asking, what "today" is, and which price wins.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use rentwell_core::lifecycle::plan;
use rentwell_core::pricing::{inclusive_days, RentalTerms};
use rentwell_core::validation::{validate_booking_request, validate_id, validate_request_key};
use rentwell_core::{
    Availability, BookingRequest, CoreError, Item, PricingPolicy, Quote, RentalAction,
    RentalDetail, RentalStatus, Transition,
};
use rentwell_db::{Database, NewRental, ReserveOutcome, TransitionOutcome};

use crate::error::{ApiError, ApiResult};

/// Today's date, as the rental rules see it.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A rental that was created, or found by its idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub id: String,
    pub replayed: bool,
}

/// A rental's status after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: String,
    pub status: RentalStatus,
}

/// The rental engine.
#[derive(Clone)]
pub struct RentalEngine {
    db: Database,
    pricing_policy: PricingPolicy,
}

impl RentalEngine {
    pub fn new(db: Database, pricing_policy: PricingPolicy) -> Self {
        RentalEngine { db, pricing_policy }
    }

    pub fn pricing_policy(&self) -> PricingPolicy {
        self.pricing_policy
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Books an item for `renter_id`.
    ///
    /// The availability check, the insert and the item status change happen
    /// in one transaction. A request key the renter already used returns the
    /// rental it created.
    pub async fn create_rental(
        &self,
        renter_id: &str,
        request: BookingRequest,
        request_key: Option<String>,
    ) -> ApiResult<Created> {
        validate_booking_request(&request)?;
        if let Some(key) = &request_key {
            validate_request_key(key)?;
        }

        let new = NewRental {
            item_id: request.item_id.clone(),
            renter_id: renter_id.to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            terms: RentalTerms {
                days: request.days,
                price_per_day: request.price_per_day,
                total_price: request.total_price,
            },
            request_key,
        };

        let policy = self.pricing_policy;
        let quoted_days = inclusive_days(request.start_date, request.end_date)?;
        let reprice = move |item: &Item, client: RentalTerms| -> RentalTerms {
            let quote = Quote::for_days(item.price_daily, quoted_days);
            let decision = policy.decide(client, &quote);
            if decision.mismatch {
                warn!(
                    item_id = %item.id,
                    policy = %policy,
                    client_days = client.days,
                    client_total = %client.total_price,
                    quoted_days = quote.days,
                    quoted_total = %quote.total,
                    "Client pricing differs from quote"
                );
            }
            decision.terms
        };

        let outcome = self.db.rentals().reserve(new, today(), reprice).await?;

        match outcome {
            ReserveOutcome::Created(rental) => {
                info!(
                    rental_id = %rental.id,
                    item_id = %rental.item_id,
                    renter_id = %renter_id,
                    total = %rental.total_price,
                    "Rental created"
                );
                Ok(Created {
                    id: rental.id,
                    replayed: false,
                })
            }
            ReserveOutcome::Replayed(rental) => {
                info!(rental_id = %rental.id, renter_id = %renter_id, "Rental request replayed");
                Ok(Created {
                    id: rental.id,
                    replayed: true,
                })
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Whether an item can be booked today. Display only: `create_rental`
    /// checks again inside its transaction.
    pub async fn check_availability(&self, item_id: &str) -> ApiResult<Availability> {
        validate_id("itemId", item_id)?;
        Ok(self.db.rentals().check_availability(item_id, today()).await?)
    }

    /// A rental with names, visible to its renter and the item owner.
    pub async fn get_rental(&self, caller: &str, rental_id: &str) -> ApiResult<RentalDetail> {
        let detail = self
            .db
            .rentals()
            .get_detail(rental_id)
            .await?
            .filter(|d| d.rental.is_renter(caller) || d.owner_id == caller)
            .ok_or_else(|| rental_not_found(rental_id))?;

        Ok(detail)
    }

    /// The caller's own rentals, newest first.
    pub async fn list_mine(&self, caller: &str) -> ApiResult<Vec<RentalDetail>> {
        Ok(self.db.rentals().list_by_renter(caller).await?)
    }

    /// Rentals of the caller's items by other users, newest first.
    pub async fn list_my_items(&self, caller: &str) -> ApiResult<Vec<RentalDetail>> {
        Ok(self.db.rentals().list_for_owner(caller).await?)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// The renter or owner confirms the item changed hands.
    pub async fn confirm_pickup(&self, caller: &str, rental_id: &str) -> ApiResult<StatusChange> {
        self.act(caller, rental_id, RentalAction::ConfirmPickup).await
    }

    /// The renter or owner confirms the item came back.
    pub async fn confirm_return(&self, caller: &str, rental_id: &str) -> ApiResult<StatusChange> {
        self.act(caller, rental_id, RentalAction::ConfirmReturn).await
    }

    /// Closes a rental without a return confirmation.
    pub async fn complete(&self, caller: &str, rental_id: &str) -> ApiResult<StatusChange> {
        self.act(caller, rental_id, RentalAction::Complete).await
    }

    /// The renter calls off a rental that has not started.
    pub async fn cancel(&self, caller: &str, rental_id: &str) -> ApiResult<StatusChange> {
        self.act(caller, rental_id, RentalAction::Cancel).await
    }

    /// Runs `action` for `caller`.
    ///
    /// Callers who may not act on the rental get `NotFound`, as if it did
    /// not exist. If the rental moves between the read and the write, the
    /// action is planned once more against the status it moved to.
    async fn act(
        &self,
        caller: &str,
        rental_id: &str,
        action: RentalAction,
    ) -> ApiResult<StatusChange> {
        let rentals = self.db.rentals();

        let detail = rentals
            .get_detail(rental_id)
            .await?
            .ok_or_else(|| rental_not_found(rental_id))?;

        let is_renter = detail.rental.is_renter(caller);
        let allowed = if action.renter_only() {
            is_renter
        } else {
            is_renter || detail.owner_id == caller
        };
        if !allowed {
            debug!(rental_id = %rental_id, caller = %caller, action = %action, "Caller may not act");
            return Err(rental_not_found(rental_id));
        }

        let mut current = detail.rental.status;
        for attempt in 0..2 {
            let (from, to) = match plan(rental_id, current, action)? {
                Transition::Unchanged(status) => {
                    debug!(rental_id = %rental_id, action = %action, status = %status, "No-op transition");
                    return Ok(StatusChange {
                        id: rental_id.to_string(),
                        status,
                    });
                }
                Transition::Change { from, to } => (from, to),
            };

            match rentals.apply_transition(rental_id, from, to).await? {
                TransitionOutcome::Applied { rental, .. } => {
                    return Ok(StatusChange {
                        id: rental.id,
                        status: rental.status,
                    });
                }
                TransitionOutcome::Stale { current: moved } => {
                    debug!(rental_id = %rental_id, expected = %from, current = %moved, attempt, "Rental moved, replanning");
                    current = moved;
                }
            }
        }

        Err(CoreError::InvalidTransition {
            rental_id: rental_id.to_string(),
            from: current,
            action,
        }
        .into())
    }
}

fn rental_not_found(rental_id: &str) -> ApiError {
    ApiError::not_found(format!("Rental not found: {rental_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Duration;
    use rentwell_core::{ItemDraft, ItemStatus, Money, MAX_RENTAL_DAYS};
    use rentwell_db::DbConfig;

    async fn setup(policy: PricingPolicy) -> (RentalEngine, Database, Item) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert("owner", "Olive", "olive@example.com").await.unwrap();
        db.users().insert("bob", "Bob", "bob@example.com").await.unwrap();
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
                    photos: vec![],
                    price_daily: Money::from_cents(2500),
                    security_deposit: Money::zero(),
                },
            )
            .await
            .unwrap();
        (RentalEngine::new(db.clone(), policy), db, item)
    }

    fn request(item_id: &str, days: i64, per_day: i64, total: i64) -> BookingRequest {
        let start = today();
        BookingRequest {
            item_id: item_id.to_string(),
            start_date: start,
            end_date: start + Duration::days(days - 1),
            days,
            price_per_day: Money::from_cents(per_day),
            total_price: Money::from_cents(total),
        }
    }

    #[tokio::test]
    async fn test_trust_client_keeps_client_prices() {
        let (engine, db, item) = setup(PricingPolicy::TrustClient).await;

        let created = engine
            .create_rental("bob", request(&item.id, 3, 100, 300), None)
            .await
            .unwrap();

        let rental = db.rentals().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(rental.total_price.cents(), 300);
        assert_eq!(rental.status, RentalStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_recompute_uses_quote() {
        let (engine, db, item) = setup(PricingPolicy::Recompute).await;

        let created = engine
            .create_rental("bob", request(&item.id, 3, 100, 300), None)
            .await
            .unwrap();

        let rental = db.rentals().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(rental.days, 3);
        assert_eq!(rental.price_per_day.cents(), 2500);
        assert_eq!(rental.total_price.cents(), 7500);
    }

    #[tokio::test]
    async fn test_overlong_range_rejected_under_recompute() {
        let (engine, db, item) = setup(PricingPolicy::Recompute).await;

        let mut long = request(&item.id, 1, 1, 1);
        long.end_date = long.start_date + Duration::days(400);

        let err = engine.create_rental("bob", long, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(engine.list_mine("bob").await.unwrap().is_empty());
        let item = db.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Available);
    }

    #[tokio::test]
    async fn test_longest_allowed_range_is_quoted_in_full() {
        let (engine, db, item) = setup(PricingPolicy::Recompute).await;

        let mut longest = request(&item.id, 1, 1, 1);
        longest.end_date = longest.start_date + Duration::days(MAX_RENTAL_DAYS - 1);

        let created = engine.create_rental("bob", longest, None).await.unwrap();
        let rental = db.rentals().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(rental.days, MAX_RENTAL_DAYS);
        assert_eq!(rental.total_price.cents(), 2500 * MAX_RENTAL_DAYS);
    }

    #[tokio::test]
    async fn test_replayed_key_returns_same_rental() {
        let (engine, _db, item) = setup(PricingPolicy::TrustClient).await;
        let key = Some("booking-1".to_string());

        let first = engine
            .create_rental("bob", request(&item.id, 1, 2500, 2500), key.clone())
            .await
            .unwrap();
        let second = engine
            .create_rental("bob", request(&item.id, 1, 2500, 2500), key)
            .await
            .unwrap();

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.id, second.id);
        assert_eq!(engine.list_mine("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_is_renter_only() {
        let (engine, db, item) = setup(PricingPolicy::TrustClient).await;
        let created = engine
            .create_rental("bob", request(&item.id, 2, 2500, 5000), None)
            .await
            .unwrap();

        let err = engine.cancel("owner", &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        let err = engine.cancel("mallory", &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let rental = db.rentals().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(rental.status, RentalStatus::Confirmed);

        let done = engine.cancel("bob", &created.id).await.unwrap();
        assert_eq!(done.status, RentalStatus::Cancelled);
        let item = db.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Available);
    }

    #[tokio::test]
    async fn test_owner_may_pickup_and_complete() {
        let (engine, _db, item) = setup(PricingPolicy::TrustClient).await;
        let created = engine
            .create_rental("bob", request(&item.id, 2, 2500, 5000), None)
            .await
            .unwrap();

        let picked = engine.confirm_pickup("owner", &created.id).await.unwrap();
        assert_eq!(picked.status, RentalStatus::Active);

        // Second pickup is a no-op.
        let again = engine.confirm_pickup("bob", &created.id).await.unwrap();
        assert_eq!(again.status, RentalStatus::Active);

        let done = engine.complete("owner", &created.id).await.unwrap();
        assert_eq!(done.status, RentalStatus::Completed);

        let err = engine.cancel("bob", &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test]
    async fn test_get_rental_hidden_from_strangers() {
        let (engine, _db, item) = setup(PricingPolicy::TrustClient).await;
        let created = engine
            .create_rental("bob", request(&item.id, 1, 2500, 2500), None)
            .await
            .unwrap();

        let detail = engine.get_rental("owner", &created.id).await.unwrap();
        assert_eq!(detail.item_title, "Camera");
        assert_eq!(detail.renter_name.as_deref(), Some("Bob"));
        assert_eq!(detail.owner_name.as_deref(), Some("Olive"));

        let err = engine.get_rental("mallory", &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_db() {
        let (engine, _db, item) = setup(PricingPolicy::TrustClient).await;
        let mut bad = request(&item.id, 2, 2500, 5000);
        bad.end_date = bad.start_date - Duration::days(1);

        let err = engine.create_rental("bob", bad, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
