//! Subrental orders and reduction records repository

use sqlx::{Pool, Postgres};

use super::source::SourceQuery;
use crate::{
    error::AppResult,
    models::{ReductionRecord, SubrentalOrderItem},
};

#[derive(Clone)]
pub struct SubrentalsRepository {
    pool: Pool<Postgres>,
}

impl SubrentalsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Confirmed or delivered order items overlapping the query range.
    /// Item dates fall back to the order dates when unset. Malformed rows are
    /// returned whatever their dates, so the engine can report them.
    pub async fn list_committed_items(&self, query: &SourceQuery) -> AppResult<Vec<SubrentalOrderItem>> {
        let rows = sqlx::query_as::<_, SubrentalOrderItem>(
            r#"
            SELECT i.id, i.order_id, i.equipment_id, o.provider_id,
                   COALESCE(i.start_date, o.start_date) AS start_date,
                   COALESCE(i.end_date, o.end_date) AS end_date,
                   i.quantity, i.cost, o.status
            FROM subrental_order_items i
            JOIN subrental_orders o ON o.id = i.order_id
            WHERE lower(trim(o.status)) IN ('confirmed', 'delivered')
              AND ((COALESCE(i.start_date, o.start_date) <= $2
                    AND COALESCE(i.end_date, o.end_date) >= $1)
                   OR COALESCE(i.end_date, o.end_date) < COALESCE(i.start_date, o.start_date)
                   OR i.quantity < 0)
              AND ($3::uuid[] IS NULL OR i.equipment_id = ANY($3))
            ORDER BY start_date, i.id
            "#,
        )
        .bind(query.range.start)
        .bind(query.range.end)
        .bind(&query.equipment_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[derive(Clone)]
pub struct ReductionsRepository {
    pool: Pool<Postgres>,
}

impl ReductionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Confirmed repairs / losses overlapping the query range, plus malformed rows
    pub async fn list_committed(&self, query: &SourceQuery) -> AppResult<Vec<ReductionRecord>> {
        let rows = sqlx::query_as::<_, ReductionRecord>(
            r#"
            SELECT id, equipment_id, start_date, end_date, quantity, reason, status
            FROM equipment_reductions
            WHERE lower(trim(status)) IN ('confirmed', 'delivered')
              AND ((start_date <= $2 AND end_date >= $1)
                   OR end_date < start_date
                   OR quantity < 0)
              AND ($3::uuid[] IS NULL OR equipment_id = ANY($3))
            ORDER BY start_date, id
            "#,
        )
        .bind(query.range.start)
        .bind(query.range.end)
        .bind(&query.equipment_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
