//! # Availability
//!
//! Decides whether an item can be booked, from rental facts and a date.
//!
//! ## How Availability Is Computed
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Availability Check                                   │
//! │                                                                         │
//! │  Store supplies candidates:                                             │
//! │    rentals WHERE item_id = ? AND status IN (confirmed, active)          │
//! │                            AND end_date >= today                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  THIS MODULE (pure):                                                    │
//! │    re-filter with Rental::blocks_on(today)                              │
//! │    none left  → available                                               │
//! │    otherwise  → unavailable, current = latest end_date                  │
//! │                 (ties: latest created_at, then greatest id)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Availability is computed from time, not from `Item.status`: a rental whose
//! end date has passed stops blocking even if no one returned it. There is no
//! background expiry job.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Rental;

/// Result of an availability check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Availability {
    pub available: bool,
    /// The rental holding the item, when unavailable.
    pub current_rental: Option<Rental>,
}

impl Availability {
    /// An item nobody holds.
    pub fn free() -> Self {
        Availability {
            available: true,
            current_rental: None,
        }
    }

    /// Builds the availability of one item from its candidate rentals.
    ///
    /// Candidates that do not block on `today` are ignored, so callers may
    /// pass any superset of the blocking rentals.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use rentwell_core::Availability;
    ///
    /// let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    /// let availability = Availability::from_candidates(Vec::new(), today);
    /// assert!(availability.available);
    /// ```
    pub fn from_candidates(candidates: Vec<Rental>, today: NaiveDate) -> Self {
        match select_current_rental(candidates, today) {
            Some(rental) => Availability {
                available: false,
                current_rental: Some(rental),
            },
            None => Availability::free(),
        }
    }
}

/// Picks the rental that currently holds an item, if any.
///
/// Exactly one rental is returned however many block: the one with the
/// latest end date, then the latest creation time, then the greatest id.
pub fn select_current_rental(candidates: Vec<Rental>, today: NaiveDate) -> Option<Rental> {
    candidates
        .into_iter()
        .filter(|r| r.blocks_on(today))
        .max_by(|a, b| {
            a.end_date
                .cmp(&b.end_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{PaymentStatus, RentalStatus};
    use chrono::{Duration, TimeZone, Utc};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn rental(id: &str, status: RentalStatus, end: u32, created_minute: u32) -> Rental {
        let created = Utc.with_ymd_and_hms(2026, 2, 1, 12, created_minute, 0).unwrap();
        Rental {
            id: id.to_string(),
            item_id: "item-a".to_string(),
            renter_id: "renter".to_string(),
            start_date: date(1),
            end_date: date(end),
            days: end as i64,
            price_per_day: Money::from_cents(2500),
            total_price: Money::from_cents(2500 * end as i64),
            status,
            payment_status: PaymentStatus::Paid,
            request_key: None,
            created_at: created,
            updated_at: created + Duration::minutes(1),
        }
    }

    #[test]
    fn test_no_candidates_is_available() {
        let availability = Availability::from_candidates(vec![], date(5));
        assert_eq!(availability, Availability::free());
    }

    #[test]
    fn test_latest_end_date_wins() {
        let candidates = vec![
            rental("r-1", RentalStatus::Confirmed, 10, 0),
            rental("r-2", RentalStatus::Active, 20, 0),
            rental("r-3", RentalStatus::Confirmed, 15, 0),
        ];

        let availability = Availability::from_candidates(candidates, date(5));
        assert!(!availability.available);
        assert_eq!(availability.current_rental.unwrap().id, "r-2");
    }

    #[test]
    fn test_ties_break_on_created_at_then_id() {
        let candidates = vec![
            rental("r-a", RentalStatus::Confirmed, 10, 5),
            rental("r-b", RentalStatus::Confirmed, 10, 9),
        ];
        let current = select_current_rental(candidates, date(5)).unwrap();
        assert_eq!(current.id, "r-b");

        let candidates = vec![
            rental("r-b", RentalStatus::Confirmed, 10, 5),
            rental("r-a", RentalStatus::Confirmed, 10, 5),
        ];
        let current = select_current_rental(candidates, date(5)).unwrap();
        assert_eq!(current.id, "r-b");
    }

    #[test]
    fn test_expired_rental_does_not_block() {
        let candidates = vec![rental("r-1", RentalStatus::Active, 4, 0)];
        let availability = Availability::from_candidates(candidates, date(5));
        assert!(availability.available);
        assert!(availability.current_rental.is_none());
    }

    #[test]
    fn test_end_date_today_still_blocks() {
        let candidates = vec![rental("r-1", RentalStatus::Confirmed, 5, 0)];
        assert!(!Availability::from_candidates(candidates, date(5)).available);
    }

    #[test]
    fn test_non_occupying_candidates_are_ignored() {
        let candidates = vec![
            rental("r-1", RentalStatus::Cancelled, 30, 0),
            rental("r-2", RentalStatus::Completed, 30, 0),
            rental("r-3", RentalStatus::Pending, 30, 0),
        ];
        assert!(Availability::from_candidates(candidates, date(5)).available);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(Availability::free()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"available": true, "currentRental": null})
        );
    }
}
