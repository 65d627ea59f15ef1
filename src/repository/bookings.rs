//! Bookings repository (event equipment lines joined with events and projects)

use sqlx::{Pool, Postgres};

use super::source::SourceQuery;
use crate::{error::AppResult, models::Booking};

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List committed equipment usage between two dates, in event order
    pub async fn list(&self, query: &SourceQuery) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT ee.id, ee.equipment_id, ev.id AS event_id, ev.project_id,
                   ev.event_date AS date, ee.quantity,
                   ev.name AS event_name, p.name AS project_name, ev.location
            FROM event_equipment ee
            JOIN events ev ON ev.id = ee.event_id
            JOIN projects p ON p.id = ev.project_id
            WHERE ev.event_date >= $1 AND ev.event_date <= $2
              AND ($3::uuid[] IS NULL OR ee.equipment_id = ANY($3))
            ORDER BY ev.event_date, ev.start_time NULLS LAST, ee.created_at, ee.id
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
