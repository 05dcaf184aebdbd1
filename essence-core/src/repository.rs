use async_trait::async_trait;
use essence_catalog::{Combo, Product};
use uuid::Uuid;

use crate::search::{Pagination, ProductFilter, SortSpec};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate value for unique field {field}: {value}")]
    Conflict { field: &'static str, value: String },
    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository trait for product catalog access
///
/// Implementations must reject a second record sharing a `slug` or `sku`
/// with [`StoreError::Conflict`].
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(&self, product: &Product) -> StoreResult<()>;

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    /// First record matching `filter`.
    async fn find_product(&self, filter: &ProductFilter) -> StoreResult<Option<Product>>;

    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: &SortSpec,
        pagination: &Pagination,
    ) -> StoreResult<Vec<Product>>;

    async fn count_products(&self, filter: &ProductFilter) -> StoreResult<u64>;

    /// Distinct category values among records matching `filter`.
    async fn distinct_categories(&self, filter: &ProductFilter) -> StoreResult<Vec<String>>;

    /// Replaces the stored record with the same id. Returns the stored record,
    /// or `None` when no record has that id.
    async fn update_product(&self, product: &Product) -> StoreResult<Option<Product>>;
}

/// Repository trait for combo access
#[async_trait]
pub trait ComboRepository: Send + Sync {
    async fn create_combo(&self, combo: &Combo) -> StoreResult<()>;

    async fn get_combo(&self, id: Uuid) -> StoreResult<Option<Combo>>;

    async fn list_combos(&self) -> StoreResult<Vec<Combo>>;

    async fn update_combo(&self, combo: &Combo) -> StoreResult<Option<Combo>>;

    /// Physically removes the combo, returning what was removed.
    async fn delete_combo(&self, id: Uuid) -> StoreResult<Option<Combo>>;
}
