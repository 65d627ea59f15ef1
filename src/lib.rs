//! Rentops Inventory Server
//!
//! Virtual inventory and overbooking conflict engine for rental operations:
//! effective stock per equipment and date, conflict detection with severity,
//! and subrental provider suggestions, exposed over a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
