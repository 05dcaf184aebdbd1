use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use essence_catalog::{Combo, Product};
use essence_core::repository::{ComboRepository, ProductRepository, StoreError, StoreResult};
use essence_core::search::{Pagination, ProductFilter, SortSpec};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process document store. Each call takes the collection lock once, so
/// single-document writes are atomic; nothing spans documents.
#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<HashMap<Uuid, Product>>,
    combos: RwLock<HashMap<Uuid, Combo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Slug and sku are unique across every stored product, deleted ones included.
fn check_unique(products: &HashMap<Uuid, Product>, candidate: &Product) -> StoreResult<()> {
    for other in products.values().filter(|p| p.id != candidate.id) {
        if other.slug == candidate.slug {
            return Err(StoreError::Conflict { field: "slug", value: candidate.slug.clone() });
        }
        if other.sku == candidate.sku {
            return Err(StoreError::Conflict { field: "sku", value: candidate.sku.clone() });
        }
    }
    Ok(())
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        let mut products = self.products.write().await;
        check_unique(&products, product)?;
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn find_product(&self, filter: &ProductFilter) -> StoreResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.values().find(|p| filter.matches(p)).cloned())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: &SortSpec,
        pagination: &Pagination,
    ) -> StoreResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut matching: Vec<&Product> = products.values().filter(|p| filter.matches(p)).collect();
        matching.sort_by(|a, b| sort.compare(a, b).then_with(|| a.id.cmp(&b.id)));

        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let limit = if pagination.is_unbounded() { usize::MAX } else { pagination.limit as usize };
        Ok(matching.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count_products(&self, filter: &ProductFilter) -> StoreResult<u64> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn distinct_categories(&self, filter: &ProductFilter) -> StoreResult<Vec<String>> {
        let products = self.products.read().await;
        let categories: HashSet<&str> = products
            .values()
            .filter(|p| filter.matches(p))
            .map(|p| p.category.as_str())
            .collect();
        Ok(categories.into_iter().map(str::to_string).collect())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<Option<Product>> {
        let mut products = self.products.write().await;
        if !products.contains_key(&product.id) {
            return Ok(None);
        }
        check_unique(&products, product)?;
        products.insert(product.id, product.clone());
        Ok(Some(product.clone()))
    }
}

#[async_trait]
impl ComboRepository for MemoryStore {
    async fn create_combo(&self, combo: &Combo) -> StoreResult<()> {
        self.combos.write().await.insert(combo.id, combo.clone());
        Ok(())
    }

    async fn get_combo(&self, id: Uuid) -> StoreResult<Option<Combo>> {
        Ok(self.combos.read().await.get(&id).cloned())
    }

    async fn list_combos(&self) -> StoreResult<Vec<Combo>> {
        let combos = self.combos.read().await;
        let mut all: Vec<Combo> = combos.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn update_combo(&self, combo: &Combo) -> StoreResult<Option<Combo>> {
        let mut combos = self.combos.write().await;
        match combos.get_mut(&combo.id) {
            Some(stored) => {
                *stored = combo.clone();
                Ok(Some(combo.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_combo(&self, id: Uuid) -> StoreResult<Option<Combo>> {
        Ok(self.combos.write().await.remove(&id))
    }
}
