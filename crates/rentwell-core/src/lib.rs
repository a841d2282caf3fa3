//! # rentwell-core
//!
//! The rental rules, with no I/O: what an item and a rental are, which
//! rental occupies an item, which status changes are legal, and what a
//! booking costs. Storage lives in `rentwell-db`, HTTP in `rental-api`.
//!
//! ```text
//! rentwell-client ─HTTP─► rental-api ─► rentwell-db ─► SQLite
//!        │                    │              │
//!        └────────────────────┴──────────────┴──► rentwell-core
//! ```
//!
//! Nothing here reads the clock. Callers pass "today" in, which keeps the
//! occupancy rules testable with fixed dates.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rentwell_core::money::Money;
//! use rentwell_core::pricing::Quote;
//!
//! let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
//!
//! let quote = Quote::for_range(Money::from_cents(2500), start, end).unwrap();
//! assert_eq!(quote.days, 3);
//! assert_eq!(quote.total.cents(), 7500);
//! ```

pub mod availability;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

pub use availability::Availability;
pub use error::{CoreError, ValidationError};
pub use lifecycle::{RentalAction, Transition};
pub use money::Money;
pub use pricing::{PricingPolicy, Quote};
pub use types::*;

/// Longest span one booking may cover. Catches date-picker slips like 2062
/// for 2026.
pub const MAX_RENTAL_DAYS: i64 = 365;

/// One cent.
pub const MIN_PRICE_DAILY_CENTS: i64 = 1;

/// Upper bound on an `Idempotency-Key` header.
pub const MAX_REQUEST_KEY_LEN: usize = 128;
