//! Users, items, rentals and their statuses.
//!
//! ```text
//! User ◄── Item.owner_id
//! User ◄── Rental.renter_id
//! Item ◄── Rental.item_id
//!
//! RentalStatus   pending → confirmed → active → completed
//!                              └──────────┴────► cancelled (from pending/confirmed)
//! occupying:     confirmed, active
//! ```
//!
//! `Item.status` is `Rented` exactly when some rental of the item is
//! occupying. The rental rows are authoritative; the item column is kept in
//! step with them inside the same transaction and only serves cheap reads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{self, Money};

// =============================================================================
// User
// =============================================================================

/// A marketplace member. Read-only here; used to render names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

// =============================================================================
// Item Status
// =============================================================================

/// Whether an item can be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ItemStatus {
    /// Listed and free.
    Available,
    /// Held by an occupying rental. Only ever set by the rental engine.
    Rented,
    /// Taken off the market by its owner.
    Unavailable,
}

impl ItemStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Rented => "rented",
            ItemStatus::Unavailable => "unavailable",
        }
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Available
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Item
// =============================================================================

/// A listing for a physical object rented by the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Lister. Immutable after creation.
    pub owner_id: String,

    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,

    /// Photo URLs, stored as a JSON array.
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub photos: Vec<String>,

    /// Daily rate (>= $0.01).
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub price_daily: Money,

    /// Refundable deposit (>= $0.00).
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub security_deposit: Money,

    pub status: ItemStatus,

    /// When the item was listed.
    #[ts(as = "String")]
    pub publish_date: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Bumped on every write to the row.
    pub version: i64,
}

impl Item {
    /// First photo, used as the thumbnail in rental detail.
    pub fn cover_photo(&self) -> Option<&str> {
        self.photos.first().map(String::as_str)
    }

    #[inline]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

/// Fields an owner supplies when listing a new item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub price_daily: Money,
    #[serde(with = "money::decimal", default)]
    #[ts(type = "number")]
    pub security_deposit: Money,
}

/// Partial update of an item's descriptive fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub photos: Option<Vec<String>>,
    #[serde(with = "money::decimal::option", default)]
    #[ts(type = "number | null")]
    pub price_daily: Option<Money>,
    #[serde(with = "money::decimal::option", default)]
    #[ts(type = "number | null")]
    pub security_deposit: Option<Money>,
}

impl ItemChanges {
    /// Applies the changes onto an item in place.
    pub fn apply_to(self, item: &mut Item) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(description) = self.description {
            item.description = Some(description);
        }
        if let Some(category) = self.category {
            item.category = Some(category);
        }
        if let Some(condition) = self.condition {
            item.condition = Some(condition);
        }
        if let Some(location) = self.location {
            item.location = Some(location);
        }
        if let Some(photos) = self.photos {
            item.photos = photos;
        }
        if let Some(price) = self.price_daily {
            item.price_daily = price;
        }
        if let Some(deposit) = self.security_deposit {
            item.security_deposit = deposit;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.condition.is_none()
            && self.location.is_none()
            && self.photos.is_none()
            && self.price_daily.is_none()
            && self.security_deposit.is_none()
    }
}

// =============================================================================
// Rental Status
// =============================================================================

/// Lifecycle of a rental agreement.
///
/// ```text
/// pending ──► confirmed ──► active ──► completed
///    │            │
///    └────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RentalStatus {
    /// Exists in the model; creation skips straight to `Confirmed`.
    Pending,
    /// Booked and paid, not yet picked up.
    Confirmed,
    /// Item is with the renter.
    Active,
    /// Returned or closed by either party.
    Completed,
    /// Called off before pickup.
    Cancelled,
}

impl RentalStatus {
    pub const ALL: [RentalStatus; 5] = [
        RentalStatus::Pending,
        RentalStatus::Confirmed,
        RentalStatus::Active,
        RentalStatus::Completed,
        RentalStatus::Cancelled,
    ];

    /// Statuses that hold the item.
    pub const OCCUPYING: [RentalStatus; 2] = [RentalStatus::Confirmed, RentalStatus::Active];

    /// Whether a rental in this status keeps its item `rented`.
    #[inline]
    pub const fn is_occupying(&self) -> bool {
        matches!(self, RentalStatus::Confirmed | RentalStatus::Active)
    }

    /// No transition leaves a terminal status.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, RentalStatus::Completed | RentalStatus::Cancelled)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Confirmed => "confirmed",
            RentalStatus::Active => "active",
            RentalStatus::Completed => "completed",
            RentalStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RentalStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: RentalStatus::ALL
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment is a stub: rentals are marked paid the moment they are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

// =============================================================================
// Rental
// =============================================================================

/// A renter's agreement to hold one item for a date range.
///
/// Uses the snapshot pattern: `days`, `price_per_day` and `total_price` are
/// frozen at creation and never recomputed, even if the item's price changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Rental {
    pub id: String,
    pub item_id: String,
    pub renter_id: String,

    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// Inclusive. Always `>= start_date`.
    #[ts(as = "String")]
    pub end_date: NaiveDate,

    pub days: i64,

    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub price_per_day: Money,

    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub total_price: Money,

    pub status: RentalStatus,
    pub payment_status: PaymentStatus,

    /// Client idempotency key, unique per renter.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub request_key: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    /// Whether this rental blocks new bookings on `today`.
    ///
    /// An occupying rental whose end date has passed no longer blocks, even
    /// if nobody ran the return transition.
    #[inline]
    pub fn blocks_on(&self, today: NaiveDate) -> bool {
        self.status.is_occupying() && self.end_date >= today
    }

    #[inline]
    pub fn is_renter(&self, user_id: &str) -> bool {
        self.renter_id == user_id
    }
}

/// A rental joined with the names a tracking screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RentalDetail {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub rental: Rental,
    pub item_title: String,
    pub item_photo: Option<String>,
    pub renter_name: Option<String>,
    pub owner_id: String,
    pub owner_name: Option<String>,
}

// =============================================================================
// Booking Request
// =============================================================================

/// What a renter asks for when booking. Pricing fields come from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BookingRequest {
    pub item_id: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub days: i64,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub price_per_day: Money,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub total_price: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rental(status: RentalStatus, end: NaiveDate) -> Rental {
        let now = Utc::now();
        Rental {
            id: "r-1".to_string(),
            item_id: "i-1".to_string(),
            renter_id: "u-1".to_string(),
            start_date: end,
            end_date: end,
            days: 1,
            price_per_day: Money::from_cents(2500),
            total_price: Money::from_cents(2500),
            status,
            payment_status: PaymentStatus::Paid,
            request_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_occupying_and_terminal_sets() {
        let occupying: Vec<_> = RentalStatus::ALL
            .into_iter()
            .filter(|s| s.is_occupying())
            .collect();
        assert_eq!(occupying, RentalStatus::OCCUPYING.to_vec());

        assert!(RentalStatus::Completed.is_terminal());
        assert!(RentalStatus::Cancelled.is_terminal());
        assert!(!RentalStatus::Active.is_terminal());
        assert!(!RentalStatus::Pending.is_occupying());
    }

    #[test]
    fn test_rental_status_round_trips_through_str() {
        for status in RentalStatus::ALL {
            assert_eq!(status.as_str().parse::<RentalStatus>().unwrap(), status);
        }
        assert!("returned".parse::<RentalStatus>().is_err());
    }

    #[test]
    fn test_blocks_on_respects_end_date() {
        let r = rental(RentalStatus::Active, date(10));
        assert!(r.blocks_on(date(9)));
        assert!(r.blocks_on(date(10)));
        assert!(!r.blocks_on(date(11)));

        let cancelled = rental(RentalStatus::Cancelled, date(10));
        assert!(!cancelled.blocks_on(date(1)));
    }

    #[test]
    fn test_rental_wire_format() {
        let json = serde_json::to_value(rental(RentalStatus::Confirmed, date(3))).unwrap();
        assert_eq!(json["itemId"], "i-1");
        assert_eq!(json["endDate"], "2026-03-03");
        assert_eq!(json["pricePerDay"], serde_json::json!(25.0));
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["paymentStatus"], "paid");
        assert!(json.get("requestKey").is_none());

        let mut keyed = rental(RentalStatus::Confirmed, date(3));
        keyed.request_key = Some("k-1".to_string());
        let json = serde_json::to_value(keyed).unwrap();
        assert_eq!(json["requestKey"], "k-1");
    }

    #[test]
    fn test_request_key_is_optional_in_typescript() {
        let decl = Rental::decl();
        assert!(decl.contains("requestKey?: string"), "{decl}");
        assert!(!decl.contains("requestKey: string | null"), "{decl}");
    }

    #[test]
    fn test_booking_request_accepts_mobile_payload() {
        let body = r#"{
            "itemId": "item-a",
            "startDate": "2026-03-01",
            "endDate": "2026-03-03",
            "days": 3,
            "pricePerDay": 25,
            "totalPrice": 75.0
        }"#;
        let req: BookingRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.days, 3);
        assert_eq!(req.total_price.cents(), 7500);
    }

    #[test]
    fn test_item_changes_apply() {
        let now = Utc::now();
        let mut item = Item {
            id: "i-1".to_string(),
            owner_id: "u-1".to_string(),
            title: "Drill".to_string(),
            description: None,
            category: None,
            condition: None,
            location: None,
            photos: vec![],
            price_daily: Money::from_cents(1000),
            security_deposit: Money::zero(),
            status: ItemStatus::Available,
            publish_date: now,
            updated_at: now,
            version: 0,
        };

        let changes: ItemChanges =
            serde_json::from_str(r#"{"title": "Cordless drill", "priceDaily": 12.5}"#).unwrap();
        assert!(!changes.is_empty());
        changes.apply_to(&mut item);

        assert_eq!(item.title, "Cordless drill");
        assert_eq!(item.price_daily.cents(), 1250);
        assert_eq!(item.security_deposit, Money::zero());
        assert!(item.cover_photo().is_none());
    }
}
