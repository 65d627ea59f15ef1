//! Equipment model (read-only view of the equipment directory)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::StockMethod;

/// Equipment record with the figures needed to derive its base stock
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: Uuid,
    /// Equipment name
    pub name: String,
    /// Stock method ("manual" or "serial_numbers")
    pub stock_method: String,
    /// Manually maintained stock count
    pub manual_stock: Option<i32>,
    /// Serial-numbered units currently in "available" status
    pub available_units: i64,
}

impl Equipment {
    pub fn method(&self) -> StockMethod {
        StockMethod::from(self.stock_method.as_str())
    }

    /// Base stock before any virtual additions or reductions
    pub fn base_stock(&self) -> i64 {
        match self.method() {
            StockMethod::Manual => i64::from(self.manual_stock.unwrap_or(0).max(0)),
            StockMethod::SerialNumbers => self.available_units.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equipment(method: &str, manual: Option<i32>, units: i64) -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            name: "Par 64".to_string(),
            stock_method: method.to_string(),
            manual_stock: manual,
            available_units: units,
        }
    }

    #[test]
    fn test_manual_base_stock() {
        assert_eq!(equipment("manual", Some(12), 3).base_stock(), 12);
        assert_eq!(equipment("manual", None, 3).base_stock(), 0);
        assert_eq!(equipment("manual", Some(-4), 0).base_stock(), 0);
    }

    #[test]
    fn test_serial_base_stock_counts_available_units() {
        assert_eq!(equipment("serial_numbers", Some(12), 3).base_stock(), 3);
    }
}
