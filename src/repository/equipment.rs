//! Equipment directory repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::Equipment};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fetch stock figures for a set of equipment in one query.
    /// Serial-numbered units are counted when their status is "available".
    pub async fn list_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Equipment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT e.id, e.name, e.stock_method, e.manual_stock,
                   COUNT(u.id) FILTER (WHERE u.status = 'available')::bigint AS available_units
            FROM equipment e
            LEFT JOIN equipment_units u ON u.equipment_id = e.id
            WHERE e.id = ANY($1)
            GROUP BY e.id, e.name, e.stock_method, e.manual_stock
            ORDER BY e.name
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
