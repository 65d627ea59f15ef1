//! Booking model (committed equipment usage of an event)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One equipment line of an event, on the event's date
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub event_id: Uuid,
    pub project_id: Uuid,
    pub date: NaiveDate,
    pub quantity: i32,
    pub event_name: String,
    pub project_name: String,
    pub location: Option<String>,
}

/// A booking as listed on a conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AffectedBooking {
    pub event_id: Uuid,
    pub project_id: Uuid,
    pub event_name: String,
    pub project_name: String,
    pub quantity: i64,
    pub location: Option<String>,
}

impl From<&Booking> for AffectedBooking {
    fn from(b: &Booking) -> Self {
        Self {
            event_id: b.event_id,
            project_id: b.project_id,
            event_name: b.event_name.clone(),
            project_name: b.project_name.clone(),
            quantity: i64::from(b.quantity),
            location: b.location.clone(),
        }
    }
}
