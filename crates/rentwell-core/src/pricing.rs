//! # Pricing
//!
//! Flat `days × daily rate` quotes, and what to do when the client's
//! numbers disagree with them.
//!
//! ## Trust Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Client sends:  days, pricePerDay, totalPrice                          │
//! │  Server knows:  startDate, endDate, item.priceDaily                    │
//! │                                                                         │
//! │  Quote = (endDate - startDate + 1) days × item.priceDaily              │
//! │                                                                         │
//! │  PricingPolicy::TrustClient  persist client values (mismatch flagged)  │
//! │  PricingPolicy::Recompute    persist the quote                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Day counts are inclusive: a Mar 1 to Mar 3 booking is three days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{self, Money};
use crate::MAX_RENTAL_DAYS;

// =============================================================================
// Quote
// =============================================================================

/// Server-side price for a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Quote {
    pub days: i64,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub price_per_day: Money,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub total: Money,
}

impl Quote {
    /// Quotes `price_daily` over the inclusive range `start..=end`.
    ///
    /// ## Errors
    /// `InvalidPeriod` if `end` is before `start` or the range is longer
    /// than [`MAX_RENTAL_DAYS`].
    pub fn for_range(price_daily: Money, start: NaiveDate, end: NaiveDate) -> CoreResult<Quote> {
        Ok(Quote::for_days(price_daily, inclusive_days(start, end)?))
    }

    /// Quotes `price_daily` over a day count already checked by
    /// [`inclusive_days`].
    pub fn for_days(price_daily: Money, days: i64) -> Quote {
        Quote {
            days,
            price_per_day: price_daily,
            total: price_daily.multiply_days(days),
        }
    }

    /// Whether client-supplied terms agree with this quote.
    pub fn matches(&self, terms: &RentalTerms) -> bool {
        self.days == terms.days
            && self.price_per_day == terms.price_per_day
            && self.total == terms.total_price
    }

    pub fn as_terms(&self) -> RentalTerms {
        RentalTerms {
            days: self.days,
            price_per_day: self.price_per_day,
            total_price: self.total,
        }
    }
}

/// Number of days in `start..=end`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> CoreResult<i64> {
    if end < start {
        return Err(CoreError::InvalidPeriod {
            reason: format!("end date {end} is before start date {start}"),
        });
    }

    let days = (end - start).num_days() + 1;
    if days > MAX_RENTAL_DAYS {
        return Err(CoreError::InvalidPeriod {
            reason: format!("{days} days exceeds the maximum of {MAX_RENTAL_DAYS}"),
        });
    }

    Ok(days)
}

/// The priced part of a rental, as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalTerms {
    pub days: i64,
    pub price_per_day: Money,
    pub total_price: Money,
}

// =============================================================================
// Pricing Policy
// =============================================================================

/// Which numbers win when client terms and the server quote disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PricingPolicy {
    /// Persist the client's values. Mismatches are reported, not fixed.
    #[default]
    TrustClient,
    /// Persist the server quote.
    Recompute,
}

/// Outcome of applying a [`PricingPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingDecision {
    /// Terms to persist.
    pub terms: RentalTerms,
    /// Client terms differed from the quote.
    pub mismatch: bool,
}

impl PricingPolicy {
    pub fn decide(&self, client: RentalTerms, quote: &Quote) -> PricingDecision {
        let mismatch = !quote.matches(&client);
        let terms = match self {
            PricingPolicy::TrustClient => client,
            PricingPolicy::Recompute => quote.as_terms(),
        };
        PricingDecision { terms, mismatch }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PricingPolicy::TrustClient => "trust_client",
            PricingPolicy::Recompute => "recompute",
        }
    }
}

impl fmt::Display for PricingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust_client" => Ok(PricingPolicy::TrustClient),
            "recompute" => Ok(PricingPolicy::Recompute),
            _ => Err(ValidationError::NotAllowed {
                field: "pricing_policy".to_string(),
                allowed: vec!["trust_client".to_string(), "recompute".to_string()],
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
