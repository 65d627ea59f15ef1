//! Shared domain enums (status strings as stored by the upstream tables)

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Status of a subrental order or a reduction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Requested,
    Confirmed,
    Delivered,
    Returned,
    Cancelled,
    Unknown,
}

impl OrderStatus {
    /// Only confirmed and delivered records move the effective stock
    pub fn is_committed(self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Delivered)
    }
}

impl From<&str> for OrderStatus {
    fn from(v: &str) -> Self {
        match v.trim().to_ascii_lowercase().as_str() {
            "draft" => OrderStatus::Draft,
            "requested" | "pending" => OrderStatus::Requested,
            "confirmed" => OrderStatus::Confirmed,
            "delivered" => OrderStatus::Delivered,
            "returned" => OrderStatus::Returned,
            "cancelled" | "canceled" => OrderStatus::Cancelled,
            _ => OrderStatus::Unknown,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Requested => "requested",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Returned => "returned",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// StockMethod
// ---------------------------------------------------------------------------

/// How the base stock of an equipment is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockMethod {
    /// Manually maintained unit count
    Manual,
    /// Count of serial-numbered units in "available" status
    SerialNumbers,
}

impl From<&str> for StockMethod {
    fn from(v: &str) -> Self {
        match v.trim().to_ascii_lowercase().as_str() {
            "serial" | "serials" | "serial_numbers" | "serial_number" => StockMethod::SerialNumbers,
            _ => StockMethod::Manual,
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Conflict severity tier, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// InvalidationScope
// ---------------------------------------------------------------------------

/// Which upstream table a mutation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationScope {
    Bookings,
    SubrentalOrders,
    Reductions,
    EquipmentStock,
    All,
}

impl std::fmt::Display for InvalidationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InvalidationScope::Bookings => "bookings",
            InvalidationScope::SubrentalOrders => "subrental_orders",
            InvalidationScope::Reductions => "reductions",
            InvalidationScope::EquipmentStock => "equipment_stock",
            InvalidationScope::All => "all",
        };
        write!(f, "{}", label)
    }
}
