//! # rentwell-client: Booking Flow for Rentwell
//!
//! Talks to the rental API over HTTP the way the mobile app does.
//!
//! - [`api`] - [`RentalClient`], one typed call per route
//! - [`flow`] - [`BookingFlow`]: preview, confirm, track
//! - [`error`] - [`ClientError`], mapped from status + error body
//!
//! ## Example
//! ```rust,ignore
//! let client = RentalClient::new(ClientConfig {
//!     base_url: "http://localhost:8080".into(),
//!     token,
//! });
//! let flow = BookingFlow::new(client);
//!
//! match flow.preview(&item_id, start, end).await? {
//!     Preview::Ready(booking) => match flow.confirm(&booking).await? {
//!         BookingOutcome::Booked { rental_id } => show_tracking(rental_id),
//!         BookingOutcome::Unavailable { .. } => show_taken(),
//!     },
//!     Preview::Unavailable { .. } => show_taken(),
//! }
//! ```

pub mod api;
pub mod error;
pub mod flow;

pub use api::{ClientConfig, CreatedRental, ItemView, RentalClient, StatusChange};
pub use error::{ClientError, ClientResult};
pub use flow::{BookingFlow, BookingOutcome, Preview, ReadyBooking};
