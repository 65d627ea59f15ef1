//! Subrental order items and reduction records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::OrderStatus;

/// Line of a subrental order (an external borrow-in)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubrentalOrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub equipment_id: Uuid,
    pub provider_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: i32,
    pub cost: Option<Decimal>,
    /// Status of the parent order
    pub status: String,
}

/// Repair, loss or write-off temporarily removing units from stock
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReductionRecord {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: i32,
    pub reason: Option<String>,
    pub status: String,
}

/// Common view over the two interval-bearing stock adjustments
pub trait StockAdjustment {
    fn record_id(&self) -> Uuid;
    fn equipment_id(&self) -> Uuid;
    fn start_date(&self) -> NaiveDate;
    fn end_date(&self) -> NaiveDate;
    fn quantity(&self) -> i32;
    fn order_status(&self) -> OrderStatus;

    /// Inclusive on both ends
    fn covers(&self, date: NaiveDate) -> bool {
        self.start_date() <= date && date <= self.end_date()
    }

    /// Describes why the record must be skipped, if it is malformed
    fn inconsistency(&self) -> Option<&'static str> {
        if self.end_date() < self.start_date() {
            Some("end date before start date")
        } else if self.quantity() < 0 {
            Some("negative quantity")
        } else {
            None
        }
    }
}

impl StockAdjustment for SubrentalOrderItem {
    fn record_id(&self) -> Uuid {
        self.id
    }
    fn equipment_id(&self) -> Uuid {
        self.equipment_id
    }
    fn start_date(&self) -> NaiveDate {
        self.start_date
    }
    fn end_date(&self) -> NaiveDate {
        self.end_date
    }
    fn quantity(&self) -> i32 {
        self.quantity
    }
    fn order_status(&self) -> OrderStatus {
        OrderStatus::from(self.status.as_str())
    }
}

impl StockAdjustment for ReductionRecord {
    fn record_id(&self) -> Uuid {
        self.id
    }
    fn equipment_id(&self) -> Uuid {
        self.equipment_id
    }
    fn start_date(&self) -> NaiveDate {
        self.start_date
    }
    fn end_date(&self) -> NaiveDate {
        self.end_date
    }
    fn quantity(&self) -> i32 {
        self.quantity
    }
    fn order_status(&self) -> OrderStatus {
        OrderStatus::from(self.status.as_str())
    }
}
