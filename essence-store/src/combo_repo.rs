use async_trait::async_trait;
use essence_catalog::Combo;
use essence_core::repository::{ComboRepository, StoreResult};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::backend_error;

pub struct PgComboRepository {
    pool: PgPool,
}

impl PgComboRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ComboRepository for PgComboRepository {
    async fn create_combo(&self, combo: &Combo) -> StoreResult<()> {
        sqlx::query("INSERT INTO combos (id, doc, created_at) VALUES ($1, $2, $3)")
            .bind(combo.id)
            .bind(Json(combo))
            .bind(combo.created_at)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn get_combo(&self, id: Uuid) -> StoreResult<Option<Combo>> {
        let row: Option<Json<Combo>> = sqlx::query_scalar("SELECT doc FROM combos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(row.map(|Json(combo)| combo))
    }

    async fn list_combos(&self) -> StoreResult<Vec<Combo>> {
        let rows: Vec<Json<Combo>> = sqlx::query_scalar("SELECT doc FROM combos ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(rows.into_iter().map(|Json(combo)| combo).collect())
    }

    async fn update_combo(&self, combo: &Combo) -> StoreResult<Option<Combo>> {
        let row: Option<Json<Combo>> =
            sqlx::query_scalar("UPDATE combos SET doc = $1 WHERE id = $2 RETURNING doc")
                .bind(Json(combo))
                .bind(combo.id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend_error)?;

        Ok(row.map(|Json(combo)| combo))
    }

    async fn delete_combo(&self, id: Uuid) -> StoreResult<Option<Combo>> {
        let row: Option<Json<Combo>> = sqlx::query_scalar("DELETE FROM combos WHERE id = $1 RETURNING doc")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(row.map(|Json(combo)| combo))
    }
}
