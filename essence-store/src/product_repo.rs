use async_trait::async_trait;
use essence_catalog::Product;
use essence_core::repository::{ProductRepository, StoreResult};
use essence_core::search::{Pagination, ProductFilter, SortSpec};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::{backend_error, product_write_error};
use crate::sql::{push_filter, push_order_and_page};

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, slug, sku, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id)
        .bind(&product.slug)
        .bind(&product.sku)
        .bind(Json(product))
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| product_write_error(e, product))?;

        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let row: Option<Json<Product>> = sqlx::query_scalar("SELECT doc FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(row.map(|Json(product)| product))
    }

    async fn find_product(&self, filter: &ProductFilter) -> StoreResult<Option<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT doc FROM products");
        push_filter(&mut qb, filter);
        qb.push(" LIMIT 1");

        let row = qb
            .build_query_scalar::<Json<Product>>()
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(row.map(|Json(product)| product))
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: &SortSpec,
        pagination: &Pagination,
    ) -> StoreResult<Vec<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT doc FROM products");
        push_filter(&mut qb, filter);
        push_order_and_page(&mut qb, sort, pagination);

        let rows = qb
            .build_query_scalar::<Json<Product>>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(rows.into_iter().map(|Json(product)| product).collect())
    }

    async fn count_products(&self, filter: &ProductFilter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_filter(&mut qb, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn distinct_categories(&self, filter: &ProductFilter) -> StoreResult<Vec<String>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT DISTINCT doc->>'category' FROM products");
        push_filter(&mut qb, filter);

        let rows = qb
            .build_query_scalar::<Option<String>>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(rows.into_iter().flatten().collect())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<Option<Product>> {
        let row: Option<Json<Product>> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET slug = $1, sku = $2, doc = $3, updated_at = $4
            WHERE id = $5
            RETURNING doc
            "#,
        )
        .bind(&product.slug)
        .bind(&product.sku)
        .bind(Json(product))
        .bind(product.updated_at)
        .bind(product.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| product_write_error(e, product))?;

        Ok(row.map(|Json(product)| product))
    }
}
