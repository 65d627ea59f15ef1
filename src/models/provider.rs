//! Subrental provider directory entry

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Provider {
    pub id: Uuid,
    pub company_name: String,
    /// Regions served; empty means no restriction
    pub geographic_coverage: Vec<String>,
    pub reliability_rating: Option<f64>,
    pub preferred: bool,
}

impl Provider {
    /// Case-insensitive substring match in either direction.
    /// Providers without coverage restriction match every location.
    pub fn covers_location(&self, location: &str) -> bool {
        let regions: Vec<String> = self
            .geographic_coverage
            .iter()
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .collect();
        if regions.is_empty() {
            return true;
        }

        let location = location.trim().to_lowercase();
        if location.is_empty() {
            return true;
        }
        regions
            .iter()
            .any(|r| r.contains(&location) || location.contains(r.as_str()))
    }

    pub fn rating(&self) -> f64 {
        self.reliability_rating.filter(|r| r.is_finite()).unwrap_or(0.0)
    }
}
