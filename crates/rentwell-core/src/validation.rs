//! Field checks run by the API before any rule or query.
//!
//! Shape errors (missing fields, wrong JSON types) are caught during
//! deserialization. This module checks values: lengths, ranges, date order
//! and key format. The schema backs it up with CHECK, UNIQUE and foreign
//! key constraints, which surface as `DbError` rather than a 400.
//!
//! ## Usage
//! ```rust
//! use rentwell_core::validation::{validate_days, validate_request_key};
//!
//! validate_days(3).unwrap();
//! assert!(validate_request_key("").is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{BookingRequest, ItemChanges, ItemDraft};
use crate::{MAX_RENTAL_DAYS, MAX_REQUEST_KEY_LEN, MIN_PRICE_DAILY_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest item title.
const MAX_TITLE_LEN: usize = 200;

/// Longest free-text field (description, location, ...).
const MAX_TEXT_LEN: usize = 2000;

/// Most photos an item may carry.
const MAX_PHOTOS: usize = 20;

// =============================================================================
// String Validators
// =============================================================================

/// Validates that an identifier is present.
///
/// Identifiers are opaque here; an id that does not exist surfaces later
/// as `NotFound`, not as a validation failure.
pub fn validate_id(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates an item title.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::required("title"));
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(())
}

fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > MAX_TEXT_LEN => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        }),
        _ => Ok(()),
    }
}

fn validate_photos(photos: &[String]) -> ValidationResult<()> {
    if photos.len() > MAX_PHOTOS {
        return Err(ValidationError::OutOfRange {
            field: "photos".to_string(),
            min: 0,
            max: MAX_PHOTOS as i64,
        });
    }
    if photos.iter().any(|p| p.trim().is_empty()) {
        return Err(ValidationError::InvalidFormat {
            field: "photos".to_string(),
            reason: "photo URLs must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Validates a client idempotency key.
///
/// ## Rules
/// - Must not be empty
/// - At most 128 characters
/// - Printable ASCII only (it travels in an HTTP header)
///
/// ## Example
/// ```rust
/// use rentwell_core::validation::validate_request_key;
///
/// assert!(validate_request_key("3f2b8c1e-booking").is_ok());
/// assert!(validate_request_key("tab\there").is_err());
/// ```
pub fn validate_request_key(key: &str) -> ValidationResult<()> {
    if key.is_empty() {
        return Err(ValidationError::required("Idempotency-Key"));
    }

    if key.len() > MAX_REQUEST_KEY_LEN {
        return Err(ValidationError::TooLong {
            field: "Idempotency-Key".to_string(),
            max: MAX_REQUEST_KEY_LEN,
        });
    }

    if !key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ValidationError::InvalidFormat {
            field: "Idempotency-Key".to_string(),
            reason: "must be printable ASCII without spaces".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a rental length in days.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_RENTAL_DAYS (365)
pub fn validate_days(days: i64) -> ValidationResult<()> {
    if !(1..=MAX_RENTAL_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "days".to_string(),
            min: 1,
            max: MAX_RENTAL_DAYS,
        });
    }
    Ok(())
}

/// Validates a daily price (at least one cent).
pub fn validate_price_daily(field: &str, price: Money) -> ValidationResult<()> {
    if price.cents() < MIN_PRICE_DAILY_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: MIN_PRICE_DAILY_CENTS,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates an amount that may be zero but not negative.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a rental date range.
///
/// ## Rules
/// - `end` must not be before `start`
/// - `start..=end` spans at most [`MAX_RENTAL_DAYS`] days
///
/// Dates in the past are accepted; the mobile date picker already prevents
/// them and the server keeps no notion of "too late to book".
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if end < start {
        return Err(ValidationError::InvalidFormat {
            field: "endDate".to_string(),
            reason: "must not be before startDate".to_string(),
        });
    }
    if (end - start).num_days() + 1 > MAX_RENTAL_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "rental period (days)".to_string(),
            min: 1,
            max: MAX_RENTAL_DAYS,
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a booking request before it reaches the rental engine.
pub fn validate_booking_request(req: &BookingRequest) -> ValidationResult<()> {
    validate_id("itemId", &req.item_id)?;
    validate_date_range(req.start_date, req.end_date)?;
    validate_days(req.days)?;
    validate_price_daily("pricePerDay", req.price_per_day)?;
    validate_non_negative("totalPrice", req.total_price)?;
    Ok(())
}

/// Validates a new item listing.
pub fn validate_item_draft(draft: &ItemDraft) -> ValidationResult<()> {
    validate_title(&draft.title)?;
    validate_optional_text("description", draft.description.as_deref())?;
    validate_optional_text("category", draft.category.as_deref())?;
    validate_optional_text("condition", draft.condition.as_deref())?;
    validate_optional_text("location", draft.location.as_deref())?;
    validate_photos(&draft.photos)?;
    validate_price_daily("priceDaily", draft.price_daily)?;
    validate_non_negative("securityDeposit", draft.security_deposit)?;
    Ok(())
}

/// Validates an item edit. Only fields present are checked.
pub fn validate_item_changes(changes: &ItemChanges) -> ValidationResult<()> {
    if changes.is_empty() {
        return Err(ValidationError::InvalidFormat {
            field: "body".to_string(),
            reason: "no fields to update".to_string(),
        });
    }
    if let Some(title) = &changes.title {
        validate_title(title)?;
    }
    validate_optional_text("description", changes.description.as_deref())?;
    validate_optional_text("category", changes.category.as_deref())?;
    validate_optional_text("condition", changes.condition.as_deref())?;
    validate_optional_text("location", changes.location.as_deref())?;
    if let Some(photos) = &changes.photos {
        validate_photos(photos)?;
    }
    if let Some(price) = changes.price_daily {
        validate_price_daily("priceDaily", price)?;
    }
    if let Some(deposit) = changes.security_deposit {
        validate_non_negative("securityDeposit", deposit)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn booking() -> BookingRequest {
        BookingRequest {
            item_id: "item-a".to_string(),
            start_date: date(1),
            end_date: date(3),
            days: 3,
            price_per_day: Money::from_cents(2500),
            total_price: Money::from_cents(7500),
        }
    }

    fn draft() -> ItemDraft {
        ItemDraft {
            title: "Camping tent".to_string(),
            description: Some("Sleeps four".to_string()),
            category: Some("outdoors".to_string()),
            condition: None,
            location: None,
            photos: vec!["https://img.example/tent.jpg".to_string()],
            price_daily: Money::from_cents(1500),
            security_deposit: Money::zero(),
        }
    }

    #[test]
    fn test_valid_booking() {
        assert!(validate_booking_request(&booking()).is_ok());
    }

    #[test]
    fn test_booking_rejects_inverted_dates() {
        let mut req = booking();
        req.end_date = date(1);
        req.start_date = date(2);
        assert!(matches!(
            validate_booking_request(&req),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_booking_rejects_overlong_range() {
        let mut req = booking();
        req.end_date = req.start_date + chrono::Duration::days(MAX_RENTAL_DAYS);
        assert!(matches!(
            validate_booking_request(&req),
            Err(ValidationError::OutOfRange { .. })
        ));

        req.end_date -= chrono::Duration::days(1);
        req.days = MAX_RENTAL_DAYS;
        assert!(validate_booking_request(&req).is_ok());
    }

    #[test]
    fn test_booking_rejects_bad_numbers() {
        let mut req = booking();
        req.days = 0;
        assert!(validate_booking_request(&req).is_err());

        let mut req = booking();
        req.price_per_day = Money::zero();
        assert!(validate_booking_request(&req).is_err());

        let mut req = booking();
        req.total_price = Money::from_cents(-1);
        assert!(validate_booking_request(&req).is_err());

        let mut req = booking();
        req.item_id = "  ".to_string();
        assert!(matches!(
            validate_booking_request(&req),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_item_draft() {
        assert!(validate_item_draft(&draft()).is_ok());

        let mut d = draft();
        d.title = String::new();
        assert!(validate_item_draft(&d).is_err());

        let mut d = draft();
        d.price_daily = Money::zero();
        assert!(validate_item_draft(&d).is_err());

        let mut d = draft();
        d.photos = vec!["".to_string()];
        assert!(validate_item_draft(&d).is_err());
    }

    #[test]
    fn test_item_changes() {
        assert!(validate_item_changes(&ItemChanges::default()).is_err());

        let changes = ItemChanges {
            location: Some("Lisbon".to_string()),
            ..Default::default()
        };
        assert!(validate_item_changes(&changes).is_ok());

        let changes = ItemChanges {
            security_deposit: Some(Money::from_cents(-100)),
            ..Default::default()
        };
        assert!(validate_item_changes(&changes).is_err());
    }

    #[test]
    fn test_request_key() {
        assert!(validate_request_key(&"k".repeat(MAX_REQUEST_KEY_LEN)).is_ok());
        assert!(validate_request_key(&"k".repeat(MAX_REQUEST_KEY_LEN + 1)).is_err());
        assert!(validate_request_key("with space").is_err());
    }
}
