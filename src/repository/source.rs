//! Upstream data seam of the inventory engine

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Booking, DateRange, Equipment, Provider, ReductionRecord, SubrentalOrderItem},
};

/// Bulk read over one upstream table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    /// `None` reads every equipment
    pub equipment_ids: Option<Vec<Uuid>>,
    pub range: DateRange,
}

impl SourceQuery {
    pub fn new(equipment_ids: Option<Vec<Uuid>>, range: DateRange) -> Self {
        Self { equipment_ids, range }
    }

    pub fn includes(&self, equipment_id: Uuid) -> bool {
        self.equipment_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(&equipment_id))
    }
}

/// Read access to the collaborator tables, one bulk query per table.
///
/// Interval-bearing tables (subrentals, reductions) return every record whose
/// `[start, end]` overlaps `query.range`; the engine does the per-date math.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn equipment(&self, ids: &[Uuid]) -> AppResult<Vec<Equipment>>;

    async fn bookings(&self, query: &SourceQuery) -> AppResult<Vec<Booking>>;

    /// Items of orders in confirmed or delivered status
    async fn subrental_items(&self, query: &SourceQuery) -> AppResult<Vec<SubrentalOrderItem>>;

    /// Confirmed repair / loss records
    async fn reductions(&self, query: &SourceQuery) -> AppResult<Vec<ReductionRecord>>;

    async fn providers(&self) -> AppResult<Vec<Provider>>;
}
