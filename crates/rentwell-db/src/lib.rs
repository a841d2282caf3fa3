//! # rentwell-db
//!
//! SQLite storage for users, items and rentals, through sqlx.
//!
//! The rental repository owns the two write paths that must never race:
//! reserving an item ([`RentalRepository::reserve`]) and moving a rental
//! through its lifecycle ([`RentalRepository::apply_transition`]). Both
//! claim SQLite's write lock with their first statement, so concurrent
//! callers are served one after the other and each sees the last one's
//! result.
//!
//! ```rust,ignore
//! use rentwell_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("rentwell.db")).await?;
//! let item = db.items().get_by_id("item-1").await?;
//! let mine = db.rentals().list_by_renter("user-1").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::item::{ItemGuardError, ItemRepository};
pub use repository::rental::{
    NewRental, RentalRepository, ReserveError, ReserveOutcome, TransitionOutcome,
};
pub use repository::user::UserRepository;
