use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use essence_catalog::{pricing, CatalogError, NewProduct, PriceQuote, PriceRequest, Product, ProductPatch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::repository::ProductRepository;
use crate::search::{CatalogQuery, CatalogSearchParams, ProductFilter, SearchPage, DEFAULT_PAGE_SIZE};
use crate::{CoreError, CoreResult};

/// Catalog reads and writes over an injected product store
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
    page_size: u32,
}

fn product_not_found(id: Uuid) -> CoreError {
    CoreError::NotFoundError(format!("Product {id} not found"))
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self {
            products,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the page size used when a search omits `limit`.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub async fn create(&self, data: NewProduct) -> CoreResult<Product> {
        let product = Product::from_new(data, Utc::now())?;
        self.products.create_product(&product).await?;
        info!("Product created: {} ({})", product.slug, product.id);
        Ok(product)
    }

    pub async fn search(&self, params: &CatalogSearchParams, privileged: bool) -> CoreResult<SearchPage<Product>> {
        let query = CatalogQuery::build_with_page_size(params, privileged, self.page_size)?;
        debug!("Catalog search: {:?}", query);

        let items = self
            .products
            .list_products(&query.filter, &query.sort, &query.pagination)
            .await?;
        let total = self.products.count_products(&query.filter).await?;

        Ok(SearchPage {
            items,
            current_page: query.pagination.page,
            total_pages: query.pagination.total_pages(total),
            total_results: total,
        })
    }

    /// Distinct non-blank categories of non-deleted products, sorted.
    pub async fn get_categories(&self) -> CoreResult<Vec<String>> {
        let categories = self.products.distinct_categories(&ProductFilter::live()).await?;
        Ok(categories
            .into_iter()
            .filter(|category| !category.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    pub async fn get_by_slug(&self, slug: &str) -> CoreResult<Product> {
        self.products
            .find_product(&ProductFilter::live().with_slug(slug))
            .await?
            .ok_or_else(|| CoreError::NotFoundError(format!("Product '{slug}' not found")))
    }

    /// Applies the whitelisted fields of `patch`. Validation runs on a copy,
    /// so a rejected update never reaches the store.
    pub async fn update(&self, id: Uuid, patch: ProductPatch) -> CoreResult<Product> {
        let current = self.get_live(id).await?;
        let next = current.patched(patch, Utc::now())?;
        let stored = self.products.update_product(&next).await?.ok_or_else(|| product_not_found(id))?;
        info!("Product updated: {} ({})", stored.slug, stored.id);
        Ok(stored)
    }

    /// Marks the product deleted. A product that is already deleted is
    /// reported as not found.
    pub async fn soft_delete(&self, id: Uuid) -> CoreResult<Product> {
        let mut product = self.get_live(id).await?;
        product.is_deleted = true;
        product.updated_at = Utc::now();
        let stored = self.products.update_product(&product).await?.ok_or_else(|| product_not_found(id))?;
        info!("Product soft-deleted: {} ({})", stored.slug, stored.id);
        Ok(stored)
    }

    pub async fn toggle_active(&self, id: Uuid) -> CoreResult<Product> {
        let mut product = self.get_live(id).await?;
        product.is_active = !product.is_active;
        product.updated_at = Utc::now();
        let stored = self.products.update_product(&product).await?.ok_or_else(|| product_not_found(id))?;
        info!("Product {} is now {}", stored.id, if stored.is_active { "active" } else { "inactive" });
        Ok(stored)
    }

    /// Prices a purchase of the product identified by `slug`.
    pub async fn quote(&self, slug: &str, request: &PriceRequest) -> CoreResult<PriceQuote> {
        if request.quantity == 0 {
            return Err(CoreError::ValidationError("quantity must be at least 1".to_string()));
        }
        let product = self.get_by_slug(slug).await?;
        pricing::quote(&product, request).map_err(|err| match err {
            CatalogError::UnknownDecantSize(size) => {
                warn!("Quote for {} asked for unknown decant size {}", slug, size);
                CoreError::NotFoundError(format!("Decant size '{size}' not available for '{slug}'"))
            }
            other => {
                warn!("Quote for {} rejected: {}", slug, other);
                CoreError::from(other)
            }
        })
    }

    async fn get_live(&self, id: Uuid) -> CoreResult<Product> {
        self.products
            .get_product(id)
            .await?
            .filter(|product| !product.is_deleted)
            .ok_or_else(|| product_not_found(id))
    }
}
