use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::inventory::available_units;
use crate::product::{BulkPrice, CatalogError, Product};

/// Context for resolving what a customer pays for a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    /// Units requested
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Decant size key, when buying a repackaged size
    #[serde(default)]
    pub size: Option<String>,

    /// Paying by card
    #[serde(default)]
    pub with_card: bool,
}

fn default_quantity() -> u32 {
    1
}

impl Default for PriceRequest {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
            size: None,
            with_card: false,
        }
    }
}

/// Where a resolved unit price came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceSource {
    Retail,
    Bulk,
    Card,
    Exclusive,
    Decant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
    pub source: PriceSource,
    /// Units on hand for the requested size (bottles when no size is given)
    pub available: u32,
}

/// The tier with the largest threshold not above `quantity`.
fn qualifying_tier(product: &Product, quantity: u32) -> Option<&BulkPrice> {
    product
        .bulk_prices
        .iter()
        .filter(|tier| tier.min_quantity <= quantity)
        .max_by_key(|tier| tier.min_quantity)
}

/// Unit price for `quantity` units: the qualifying tier's price, falling back
/// to the retail price.
pub fn resolve_bulk_price(product: &Product, quantity: u32) -> Decimal {
    qualifying_tier(product, quantity)
        .map(|tier| tier.price)
        .unwrap_or(product.retail_price)
}

/// Price of a decant size, `None` when the product has no such size.
pub fn resolve_decant_price(product: &Product, size: &str) -> Option<Decimal> {
    product
        .decant_options
        .as_ref()?
        .sizes
        .iter()
        .find(|entry| entry.size == size)
        .map(|entry| entry.price)
}

/// Resolves the unit price for a purchase. Decant sizes are priced on their
/// own; otherwise an exclusive price, then a card price, then the bulk tiers
/// apply. Returns `None` when a requested decant size does not exist.
pub fn resolve_unit_price(product: &Product, request: &PriceRequest) -> Option<(Decimal, PriceSource)> {
    if let Some(size) = &request.size {
        return resolve_decant_price(product, size).map(|price| (price, PriceSource::Decant));
    }

    if product.is_exclusive {
        if let Some(price) = product.exclusive_price {
            return Some((price, PriceSource::Exclusive));
        }
    }

    if request.with_card {
        if let Some(price) = product.card_price {
            return Some((price, PriceSource::Card));
        }
    }

    let source = match qualifying_tier(product, request.quantity) {
        Some(_) => PriceSource::Bulk,
        None => PriceSource::Retail,
    };
    Some((resolve_bulk_price(product, request.quantity), source))
}

/// Full quote for a purchase request. Fails for an unknown decant size or a
/// line total beyond the decimal range.
pub fn quote(product: &Product, request: &PriceRequest) -> Result<PriceQuote, CatalogError> {
    let (unit_price, source) = resolve_unit_price(product, request)
        .ok_or_else(|| CatalogError::UnknownDecantSize(request.size.clone().unwrap_or_default()))?;
    let total = unit_price
        .checked_mul(Decimal::from(request.quantity))
        .ok_or(CatalogError::AmountOverflow("total"))?;

    Ok(PriceQuote {
        unit_price,
        quantity: request.quantity,
        total,
        source,
        available: available_units(product, request.size.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{DecantOptions, DecantSize, NewProduct};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn tiered_product() -> Product {
        Product::from_new(
            NewProduct {
                name: Some("Sauvage".to_string()),
                sku: Some("DIOR-SAU".to_string()),
                retail_price: Some(dec!(100)),
                card_price: Some(dec!(105)),
                category: Some("Hombre".to_string()),
                bulk_prices: Some(vec![
                    BulkPrice { min_quantity: 10, price: dec!(80) },
                    BulkPrice { min_quantity: 5, price: dec!(90) },
                ]),
                decant_options: Some(DecantOptions {
                    sizes: vec![
                        DecantSize { size: "5ml".to_string(), price: dec!(15), stock: 4 },
                        DecantSize { size: "10ml".to_string(), price: dec!(27.5), stock: 0 },
                    ],
                }),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_bulk_price_highest_qualifying_tier() {
        let product = tiered_product();
        assert_eq!(resolve_bulk_price(&product, 1), dec!(100));
        assert_eq!(resolve_bulk_price(&product, 4), dec!(100));
        assert_eq!(resolve_bulk_price(&product, 5), dec!(90));
        assert_eq!(resolve_bulk_price(&product, 9), dec!(90));
        assert_eq!(resolve_bulk_price(&product, 10), dec!(80));
        assert_eq!(resolve_bulk_price(&product, 20), dec!(80));
    }

    #[test]
    fn test_bulk_price_without_tiers() {
        let mut product = tiered_product();
        product.bulk_prices.clear();
        assert_eq!(resolve_bulk_price(&product, 50), dec!(100));
    }

    #[test]
    fn test_unit_price_agrees_with_bulk_price() {
        let product = tiered_product();
        for quantity in [1, 4, 5, 9, 10, 20] {
            let request = PriceRequest { quantity, size: None, with_card: false };
            let (unit_price, source) = resolve_unit_price(&product, &request).unwrap();
            assert_eq!(unit_price, resolve_bulk_price(&product, quantity));
            let expected = if quantity >= 5 { PriceSource::Bulk } else { PriceSource::Retail };
            assert_eq!(source, expected);
        }
    }

    #[test]
    fn test_decant_price_lookup() {
        let product = tiered_product();
        assert_eq!(resolve_decant_price(&product, "10ml"), Some(dec!(27.5)));
        assert_eq!(resolve_decant_price(&product, "3ml"), None);

        let mut plain = product.clone();
        plain.decant_options = None;
        assert_eq!(resolve_decant_price(&plain, "5ml"), None);
    }

    #[test]
    fn test_unit_price_precedence() {
        let mut product = tiered_product();

        let card = PriceRequest { quantity: 1, size: None, with_card: true };
        assert_eq!(resolve_unit_price(&product, &card), Some((dec!(105), PriceSource::Card)));

        let decant = PriceRequest { quantity: 2, size: Some("5ml".to_string()), with_card: true };
        assert_eq!(resolve_unit_price(&product, &decant), Some((dec!(15), PriceSource::Decant)));

        let missing = PriceRequest { quantity: 1, size: Some("1ml".to_string()), with_card: false };
        assert_eq!(resolve_unit_price(&product, &missing), None);

        product.is_exclusive = true;
        product.exclusive_price = Some(dec!(70));
        assert_eq!(
            resolve_unit_price(&product, &PriceRequest::default()),
            Some((dec!(70), PriceSource::Exclusive))
        );
    }

    #[test]
    fn test_exclusive_price_ignored_when_not_exclusive() {
        let mut product = tiered_product();
        product.exclusive_price = Some(dec!(70));
        assert_eq!(
            resolve_unit_price(&product, &PriceRequest::default()),
            Some((dec!(100), PriceSource::Retail))
        );
    }

    #[test]
    fn test_quote_totals() {
        let product = tiered_product();
        let request = PriceRequest { quantity: 6, size: None, with_card: false };
        let quote = quote(&product, &request).unwrap();
        assert_eq!(quote.unit_price, dec!(90));
        assert_eq!(quote.total, dec!(540));
        assert_eq!(quote.source, PriceSource::Bulk);
        assert_eq!(quote.available, 0);

        let decant = PriceRequest { quantity: 2, size: Some("5ml".to_string()), with_card: false };
        let quote = super::quote(&product, &decant).unwrap();
        assert_eq!(quote.total, dec!(30));
        assert_eq!(quote.available, 4);
    }

    #[test]
    fn test_quote_unknown_decant_size() {
        let product = tiered_product();
        let request = PriceRequest { quantity: 1, size: Some("1ml".to_string()), with_card: false };
        assert_eq!(
            quote(&product, &request).unwrap_err(),
            CatalogError::UnknownDecantSize("1ml".to_string())
        );
    }

    #[test]
    fn test_quote_total_overflow_is_an_error() {
        let mut product = tiered_product();
        product.bulk_prices.clear();
        product.retail_price = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        let request = PriceRequest { quantity: 4_000_000_000, size: None, with_card: false };
        assert_eq!(
            quote(&product, &request).unwrap_err(),
            CatalogError::AmountOverflow("total")
        );
    }
}
