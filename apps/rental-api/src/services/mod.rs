//! Service layer for the Rental API.
//!
//! Handlers stay thin: they extract the caller and the body, then call
//! into these services.

pub mod item_service;
pub mod rental_service;
