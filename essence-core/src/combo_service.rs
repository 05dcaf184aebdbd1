use std::sync::Arc;

use chrono::Utc;
use essence_catalog::{Combo, ComboPatch, NewCombo};
use tracing::info;
use uuid::Uuid;

use crate::combo::{validate_inputs, ComboPriceCalculator, PriceInputs};
use crate::repository::ComboRepository;
use crate::{CoreError, CoreResult};

/// CRUD over combos, keeping derived prices in step with their components
#[derive(Clone)]
pub struct ComboService {
    combos: Arc<dyn ComboRepository>,
    calculator: ComboPriceCalculator,
}

fn combo_not_found(id: Uuid) -> CoreError {
    CoreError::NotFoundError(format!("Combo {id} not found"))
}

impl ComboService {
    pub fn new(combos: Arc<dyn ComboRepository>, calculator: ComboPriceCalculator) -> Self {
        Self { combos, calculator }
    }

    pub async fn create(&self, data: NewCombo) -> CoreResult<Combo> {
        let name = data
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CoreError::ValidationError("Missing required field: name".to_string()))?;

        let inputs = PriceInputs {
            discount_percentage: data.discount_percentage,
            final_price: data.final_price,
            final_price_with_card: data.final_price_with_card,
        };
        let prices = self.calculator.calculate(&data.products, &inputs).await?;

        let now = Utc::now();
        let combo = Combo {
            id: Uuid::new_v4(),
            name,
            description: data.description,
            images: data.images.unwrap_or_default(),
            products: data.products,
            base_price: prices.base_price,
            discount_percentage: data.discount_percentage,
            final_price: prices.final_price,
            final_price_with_card: prices.final_price_with_card,
            is_active: data.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        self.combos.create_combo(&combo).await?;
        info!("Combo created: {} ({})", combo.name, combo.id);
        Ok(combo)
    }

    pub async fn list(&self) -> CoreResult<Vec<Combo>> {
        Ok(self.combos.list_combos().await?)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Combo> {
        self.combos.get_combo(id).await?.ok_or_else(|| combo_not_found(id))
    }

    /// Prices are recomputed only when the payload carries `products`. In that
    /// case a discount missing from the payload falls back to the stored one.
    pub async fn update(&self, id: Uuid, patch: ComboPatch) -> CoreResult<Combo> {
        let mut combo = self.get(id).await?;

        let inputs = PriceInputs {
            discount_percentage: patch.discount_percentage,
            final_price: patch.final_price,
            final_price_with_card: patch.final_price_with_card,
        };
        validate_inputs(&inputs)?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CoreError::ValidationError("name must not be blank".to_string()));
            }
            combo.name = name;
        }
        if patch.description.is_some() {
            combo.description = patch.description;
        }
        if let Some(images) = patch.images {
            combo.images = images;
        }
        if let Some(active) = patch.is_active {
            combo.is_active = active;
        }
        if inputs.discount_percentage.is_some() {
            combo.discount_percentage = inputs.discount_percentage;
        }

        match patch.products {
            Some(products) => {
                let inputs = PriceInputs {
                    discount_percentage: combo.discount_percentage,
                    ..inputs
                };
                let prices = self.calculator.calculate(&products, &inputs).await?;
                combo.products = products;
                combo.apply_prices(prices);
            }
            None => {
                if let Some(price) = inputs.final_price {
                    combo.final_price = price;
                }
                if let Some(price) = inputs.final_price_with_card {
                    combo.final_price_with_card = price;
                }
            }
        }

        combo.updated_at = Utc::now();
        let stored = self.combos.update_combo(&combo).await?.ok_or_else(|| combo_not_found(id))?;
        info!("Combo updated: {} ({})", stored.name, stored.id);
        Ok(stored)
    }

    pub async fn delete(&self, id: Uuid) -> CoreResult<Combo> {
        let removed = self.combos.delete_combo(id).await?.ok_or_else(|| combo_not_found(id))?;
        info!("Combo deleted: {} ({})", removed.name, removed.id);
        Ok(removed)
    }
}
