//! # Rentwell Rental API
//!
//! HTTP server for the rental engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rental API Server                                │
//! │                                                                         │
//! │  Mobile app ───► HTTP (8080) ───► handlers ───► services ───► SQLite   │
//! │                      │                            │                     │
//! │                bearer token                 RentalEngine                │
//! │                (AuthUser)                   item_service                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Routes
//! | Method & Path                  | Handler                       |
//! |--------------------------------|-------------------------------|
//! | `POST /rentals`                | [`handlers::rentals::create_rental`] |
//! | `GET /rentals`                 | [`handlers::rentals::list_mine`] |
//! | `GET /rentals/my-items`        | [`handlers::rentals::list_my_items`] |
//! | `GET /rentals/check/{item_id}` | [`handlers::rentals::check_availability`] |
//! | `GET /rentals/{id}`            | [`handlers::rentals::get_rental`] |
//! | `PUT /rentals/{id}/pickup`     | [`handlers::rentals::confirm_pickup`] |
//! | `PUT /rentals/{id}/return`     | [`handlers::rentals::confirm_return`] |
//! | `PUT /rentals/{id}/complete`   | [`handlers::rentals::complete`] |
//! | `DELETE /rentals/{id}`         | [`handlers::rentals::cancel`] |
//! | `POST /items`                  | [`handlers::items::create_item`] |
//! | `GET /items/{id}`              | [`handlers::items::get_item`] |
//! | `PUT /items/{id}`              | [`handlers::items::update_item`] |
//! | `PUT /items/{id}/listing`      | [`handlers::items::set_listing`] |
//! | `GET /health`                  | [`handlers::health::health`] |

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use rentwell_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::handlers::{health, items, rentals};
use crate::services::rental_service::RentalEngine;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub engine: RentalEngine,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let engine = RentalEngine::new(db.clone(), config.rentals.pricing_policy);
        let jwt = JwtManager::new(&config.auth.jwt_secret, config.auth.token_lifetime_secs);
        AppState {
            db,
            engine,
            jwt,
            config,
        }
    }
}

/// Builds the HTTP router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/rentals",
            post(rentals::create_rental).get(rentals::list_mine),
        )
        .route("/rentals/my-items", get(rentals::list_my_items))
        .route("/rentals/check/{item_id}", get(rentals::check_availability))
        .route(
            "/rentals/{id}",
            get(rentals::get_rental).delete(rentals::cancel),
        )
        .route("/rentals/{id}/pickup", put(rentals::confirm_pickup))
        .route("/rentals/{id}/return", put(rentals::confirm_return))
        .route("/rentals/{id}/complete", put(rentals::complete))
        .route("/items", post(items::create_item))
        .route("/items/{id}", get(items::get_item).put(items::update_item))
        .route("/items/{id}/listing", put(items::set_listing))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
