//! # Booking Flow
//!
//! The sequence a renter walks through on the item screen:
//!
//! ```text
//! preview(item, dates)
//!   ├── GET /items/{id}      item + availability (display only)
//!   ├── quote                 days x priceDaily
//!   └── fresh request key
//!         │
//!         ▼
//! confirm(ready)              user taps "Pay"
//!   └── POST /rentals         Idempotency-Key = ready.request_key
//!         ├── 201/200 → Booked
//!         └── 409     → Unavailable (start over)
//!         │
//!         ▼
//! track(rental_id)            GET /rentals/{id}
//! ```
//!
//! Nothing here retries on its own. Confirming the same [`ReadyBooking`]
//! twice sends the same key, so a user who taps again after a timeout
//! gets the rental from the first attempt instead of a second one.

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use rentwell_core::pricing::Quote;
use rentwell_core::{BookingRequest, Item, ItemStatus, Rental, RentalDetail};

use crate::api::RentalClient;
use crate::error::{ClientError, ClientResult};

/// A booking the user can confirm.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyBooking {
    pub item: Item,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quote: Quote,
    /// Sent as `Idempotency-Key` on every confirm of this booking.
    pub request_key: String,
}

impl ReadyBooking {
    /// The request body for `POST /rentals`.
    pub fn request(&self) -> BookingRequest {
        BookingRequest {
            item_id: self.item.id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            days: self.quote.days,
            price_per_day: self.quote.price_per_day,
            total_price: self.quote.total,
        }
    }
}

/// What the item screen shows before the user confirms.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Ready(ReadyBooking),
    /// Someone holds the item. `None` when the owner delisted it.
    Unavailable { current_rental: Option<Rental> },
}

/// Result of confirming a booking.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Booked { rental_id: String },
    /// The item was taken between preview and confirm.
    Unavailable { current_rental: Option<Box<Rental>> },
}

/// Drives one renter's bookings.
#[derive(Debug, Clone)]
pub struct BookingFlow {
    client: RentalClient,
}

impl BookingFlow {
    pub fn new(client: RentalClient) -> Self {
        BookingFlow { client }
    }

    /// Loads the item, its availability and a quote for the dates.
    pub async fn preview(
        &self,
        item_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ClientResult<Preview> {
        let view = self.client.get_item(item_id).await?;

        if view.item.status == ItemStatus::Unavailable {
            return Ok(Preview::Unavailable {
                current_rental: None,
            });
        }

        if !view.availability.available {
            return Ok(Preview::Unavailable {
                current_rental: view.availability.current_rental,
            });
        }

        let quote = Quote::for_range(view.item.price_daily, start_date, end_date)
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        Ok(Preview::Ready(ReadyBooking {
            item: view.item,
            start_date,
            end_date,
            quote,
            request_key: Uuid::new_v4().to_string(),
        }))
    }

    /// Books the previewed item. Safe to call again with the same booking.
    pub async fn confirm(&self, booking: &ReadyBooking) -> ClientResult<BookingOutcome> {
        let result = self
            .client
            .create_rental(&booking.request(), Some(&booking.request_key))
            .await;

        match result {
            Ok(created) => {
                info!(
                    rental_id = %created.id,
                    item_id = %booking.item.id,
                    replayed = created.replayed,
                    "Booking confirmed"
                );
                Ok(BookingOutcome::Booked {
                    rental_id: created.id,
                })
            }
            Err(ClientError::Conflict {
                message,
                current_rental,
            }) => {
                warn!(item_id = %booking.item.id, %message, "Item taken before confirm");
                Ok(BookingOutcome::Unavailable { current_rental })
            }
            Err(other) => Err(other),
        }
    }

    /// Current state of a booked rental.
    pub async fn track(&self, rental_id: &str) -> ClientResult<RentalDetail> {
        self.client.get_rental(rental_id).await
    }
}
