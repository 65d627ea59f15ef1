//! Data models for Rentops

pub mod booking;
pub mod enums;
pub mod equipment;
pub mod inventory;
pub mod provider;
pub mod subrental;

// Re-export commonly used types
pub use booking::{AffectedBooking, Booking};
pub use enums::{InvalidationScope, OrderStatus, Severity, StockMethod};
pub use equipment::Equipment;
pub use inventory::{
    ConflictAnalysis, ConflictFilter, ConflictReport, ConflictScope, DateRange, EffectiveStock,
    StockReport, SubrentalSuggestion, SuggestionQuery, UnknownAvailability, UnknownCause,
};
pub use provider::Provider;
pub use subrental::{ReductionRecord, StockAdjustment, SubrentalOrderItem};
