//! Liveness probe.

use std::sync::Arc;

use axum::extract::State;
use tracing::warn;

use crate::AppState;

/// `GET /health`. Always answers `OK`; a failing database is only logged.
pub async fn health(State(state): State<Arc<AppState>>) -> &'static str {
    if !state.db.health_check().await {
        warn!("Database health check failed");
    }
    "OK"
}
