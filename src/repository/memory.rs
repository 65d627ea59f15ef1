//! In-memory inventory source for tests and local development

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockWriteGuard};
use uuid::Uuid;

use super::source::{InventorySource, SourceQuery};
use crate::{
    error::{AppError, AppResult},
    models::{
        Booking, Equipment, Provider, ReductionRecord, StockAdjustment, SubrentalOrderItem,
    },
};

/// Upstream tables, used to simulate outages and to count reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamTable {
    Equipment,
    Bookings,
    Subrentals,
    Reductions,
    Providers,
}

#[derive(Debug, Default)]
struct InMemoryState {
    equipment: Vec<Equipment>,
    bookings: Vec<Booking>,
    subrentals: Vec<SubrentalOrderItem>,
    reductions: Vec<ReductionRecord>,
    providers: Vec<Provider>,
    failing: Vec<UpstreamTable>,
    latency: Option<Duration>,
    reads: HashMap<UpstreamTable, usize>,
}

impl InMemoryState {
    fn read(&mut self, table: UpstreamTable) -> AppResult<()> {
        *self.reads.entry(table).or_insert(0) += 1;
        if self.failing.contains(&table) {
            return Err(AppError::UpstreamUnavailable(format!(
                "{:?} table is unreachable",
                table
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_equipment(&self, equipment: Equipment) {
        self.state.write().await.equipment.push(equipment);
    }

    pub async fn add_booking(&self, booking: Booking) {
        self.state.write().await.bookings.push(booking);
    }

    /// Returns whether a booking was removed
    pub async fn remove_booking(&self, booking_id: Uuid) -> bool {
        let mut state = self.state.write().await;
        let before = state.bookings.len();
        state.bookings.retain(|b| b.id != booking_id);
        state.bookings.len() != before
    }

    pub async fn add_subrental_item(&self, item: SubrentalOrderItem) {
        self.state.write().await.subrentals.push(item);
    }

    pub async fn add_reduction(&self, reduction: ReductionRecord) {
        self.state.write().await.reductions.push(reduction);
    }

    pub async fn add_provider(&self, provider: Provider) {
        self.state.write().await.providers.push(provider);
    }

    /// Sets the manual stock of an equipment
    pub async fn set_manual_stock(&self, equipment_id: Uuid, stock: i32) {
        let mut state = self.state.write().await;
        if let Some(e) = state.equipment.iter_mut().find(|e| e.id == equipment_id) {
            e.manual_stock = Some(stock);
        }
    }

    /// Makes every read of `table` fail until reset
    pub async fn set_failing(&self, table: UpstreamTable, failing: bool) {
        let mut state = self.state.write().await;
        state.failing.retain(|t| *t != table);
        if failing {
            state.failing.push(table);
        }
    }

    /// Delays every read, to exercise deadlines
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().await.latency = latency;
    }

    /// Number of reads issued against `table`
    pub async fn reads(&self, table: UpstreamTable) -> usize {
        self.state.read().await.reads.get(&table).copied().unwrap_or(0)
    }
}

impl InMemorySource {
    async fn open(&self, table: UpstreamTable) -> AppResult<RwLockWriteGuard<'_, InMemoryState>> {
        let latency = self.state.read().await.latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.write().await;
        state.read(table)?;
        Ok(state)
    }
}

/// Committed records overlapping the query; malformed ones are passed through
/// so the engine can report them.
fn select_adjustments<T: StockAdjustment + Clone>(records: &[T], query: &SourceQuery) -> Vec<T> {
    records
        .iter()
        .filter(|r| query.includes(r.equipment_id()) && r.order_status().is_committed())
        .filter(|r| {
            r.inconsistency().is_some() || query.range.overlaps(r.start_date(), r.end_date())
        })
        .cloned()
        .collect()
}

#[async_trait]
impl InventorySource for InMemorySource {
    async fn equipment(&self, ids: &[Uuid]) -> AppResult<Vec<Equipment>> {
        let state = self.open(UpstreamTable::Equipment).await?;
        Ok(state
            .equipment
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }

    async fn bookings(&self, query: &SourceQuery) -> AppResult<Vec<Booking>> {
        let state = self.open(UpstreamTable::Bookings).await?;
        let mut rows: Vec<Booking> = state
            .bookings
            .iter()
            .filter(|b| query.includes(b.equipment_id) && query.range.contains(b.date))
            .cloned()
            .collect();
        // stable: insertion order within a day
        rows.sort_by_key(|b| b.date);
        Ok(rows)
    }

    async fn subrental_items(&self, query: &SourceQuery) -> AppResult<Vec<SubrentalOrderItem>> {
        let state = self.open(UpstreamTable::Subrentals).await?;
        Ok(select_adjustments(&state.subrentals, query))
    }

    async fn reductions(&self, query: &SourceQuery) -> AppResult<Vec<ReductionRecord>> {
        let state = self.open(UpstreamTable::Reductions).await?;
        Ok(select_adjustments(&state.reductions, query))
    }

    async fn providers(&self) -> AppResult<Vec<Provider>> {
        let state = self.open(UpstreamTable::Providers).await?;
        Ok(state.providers.clone())
    }
}
