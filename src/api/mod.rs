//! API handlers for Rentops REST endpoints

pub mod health;
pub mod inventory;
pub mod openapi;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// Routes mounted under `/api/v1`
pub fn routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Inventory
        .route("/inventory/effective-stock", post(inventory::effective_stock))
        .route("/inventory/conflicts", post(inventory::conflicts))
        .route("/inventory/suggestions", get(inventory::suggestions))
        .route("/inventory/equipment/:id/availability", get(inventory::availability))
        .route("/inventory/equipment/:id/overbooked", get(inventory::overbooked))
        .route("/inventory/invalidate", post(inventory::invalidate))
        .with_state(state)
}
