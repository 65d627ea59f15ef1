//! Repository layer for database operations

pub mod bookings;
pub mod equipment;
pub mod memory;
pub mod providers;
pub mod source;
pub mod subrentals;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Booking, Equipment, Provider, ReductionRecord, SubrentalOrderItem},
};

pub use memory::InMemorySource;
pub use source::{InventorySource, SourceQuery};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub equipment: equipment::EquipmentRepository,
    pub bookings: bookings::BookingsRepository,
    pub subrentals: subrentals::SubrentalsRepository,
    pub reductions: subrentals::ReductionsRepository,
    pub providers: providers::ProvidersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            equipment: equipment::EquipmentRepository::new(pool.clone()),
            bookings: bookings::BookingsRepository::new(pool.clone()),
            subrentals: subrentals::SubrentalsRepository::new(pool.clone()),
            reductions: subrentals::ReductionsRepository::new(pool.clone()),
            providers: providers::ProvidersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database (readiness check)
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl InventorySource for Repository {
    async fn equipment(&self, ids: &[Uuid]) -> AppResult<Vec<Equipment>> {
        self.equipment.list_by_ids(ids).await
    }

    async fn bookings(&self, query: &SourceQuery) -> AppResult<Vec<Booking>> {
        self.bookings.list(query).await
    }

    async fn subrental_items(&self, query: &SourceQuery) -> AppResult<Vec<SubrentalOrderItem>> {
        self.subrentals.list_committed_items(query).await
    }

    async fn reductions(&self, query: &SourceQuery) -> AppResult<Vec<ReductionRecord>> {
        self.reductions.list_committed(query).await
    }

    async fn providers(&self) -> AppResult<Vec<Provider>> {
        self.providers.list().await
    }
}
