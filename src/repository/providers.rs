//! Subrental provider directory repository

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::Provider};

#[derive(Clone)]
pub struct ProvidersRepository {
    pool: Pool<Postgres>,
}

impl ProvidersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List providers in directory order (ties in ranking keep this order)
    pub async fn list(&self) -> AppResult<Vec<Provider>> {
        let rows = sqlx::query_as::<_, Provider>(
            r#"
            SELECT id, company_name,
                   COALESCE(geographic_coverage, ARRAY[]::text[]) AS geographic_coverage,
                   reliability_rating::double precision AS reliability_rating,
                   COALESCE(preferred, FALSE) AS preferred
            FROM subrental_providers
            ORDER BY company_name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
