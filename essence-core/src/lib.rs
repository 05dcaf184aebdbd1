pub mod repository;
pub mod search;
pub mod combo;
pub mod catalog_service;
pub mod combo_service;

use essence_catalog::{CatalogError, InventoryError};
use repository::StoreError;

pub use catalog_service::CatalogService;
pub use combo::{ComboPriceCalculator, ComboPricing};
pub use combo_service::ComboService;
pub use repository::{ComboRepository, ProductRepository};
pub use search::{CatalogQuery, CatalogSearchParams, SearchPage};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStockError {
        product: String,
        requested: u32,
        available: u32,
    },
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<CatalogError> for CoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownDecantSize(_) => CoreError::NotFoundError(err.to_string()),
            _ => CoreError::ValidationError(err.to_string()),
        }
    }
}

impl From<InventoryError> for CoreError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientInventory { product, requested, available } => {
                CoreError::InsufficientStockError { product, requested, available }
            }
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { field, value } => {
                CoreError::ConflictError(format!("{field} '{value}' is already in use"))
            }
            StoreError::Backend(msg) => CoreError::InternalError(msg),
        }
    }
}
