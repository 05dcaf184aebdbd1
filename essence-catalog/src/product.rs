use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// How a product is offered in the storefront
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SellType {
    Perfume,
    Decant,
    Both,
}

impl SellType {
    /// Parses one of the recognized sell types, `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "perfume" => Some(Self::Perfume),
            "decant" => Some(Self::Decant),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Perfume => "perfume",
            Self::Decant => "decant",
            Self::Both => "both",
        }
    }
}

/// A bulk pricing tier: buying at least `min_quantity` units costs `price` each.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkPrice {
    pub min_quantity: u32,
    pub price: Decimal,
}

/// One repackaged size of a product (e.g. "5ml").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecantSize {
    pub size: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecantOptions {
    #[serde(default)]
    pub sizes: Vec<DecantSize>,
}

/// Core catalog item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub sku: String,
    pub retail_price: Decimal,
    #[serde(default)]
    pub card_price: Option<Decimal>,
    #[serde(default)]
    pub exclusive_price: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub bulk_prices: Vec<BulkPrice>,
    #[serde(default)]
    pub sell_type: Option<SellType>,
    #[serde(default)]
    pub decant_options: Option<DecantOptions>,
    pub is_active: bool,
    pub is_exclusive: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted by catalog create. Required fields are optional here so
/// that their absence is reported as a validation failure instead of a
/// deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub retail_price: Option<Decimal>,
    pub card_price: Option<Decimal>,
    pub exclusive_price: Option<Decimal>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub bulk_prices: Option<Vec<BulkPrice>>,
    pub sell_type: Option<SellType>,
    pub decant_options: Option<DecantOptions>,
    pub is_active: Option<bool>,
    pub is_exclusive: Option<bool>,
}

/// Mutable fields of a product. Anything not listed here (slug, deletion
/// flag, timestamps) cannot be changed through an update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub retail_price: Option<Decimal>,
    /// `Some(None)` clears the card price
    #[serde(default, deserialize_with = "nullable")]
    pub card_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub exclusive_price: Option<Option<Decimal>>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub bulk_prices: Option<Vec<BulkPrice>>,
    pub is_active: Option<bool>,
    pub is_exclusive: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub sell_type: Option<Option<SellType>>,
    #[serde(default, deserialize_with = "nullable")]
    pub decant_options: Option<Option<DecantOptions>>,
}

/// Absent field is `None`, explicit `null` is `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Catalog validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} must not be negative")]
    NegativeAmount { field: &'static str },

    #[error("Bulk price minimum quantities must be unique (repeated: {0})")]
    DuplicateTier(u32),

    #[error("Bulk price minimum quantity must be at least 1")]
    ZeroTierQuantity,

    #[error("Decant sizes must be unique (repeated: {0})")]
    DuplicateDecantSize(String),

    #[error("Name does not produce a usable slug: {0}")]
    EmptySlug(String),

    #[error("Decant size '{0}' is not available")]
    UnknownDecantSize(String),

    #[error("{0} exceeds the supported amount range")]
    AmountOverflow(&'static str),
}

/// Derives a URL-safe slug: lower-cases the name, collapses every run of
/// characters outside `[a-z0-9]` into one hyphen and drops hyphens at either end.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Sorts tiers ascending by threshold and rejects repeated thresholds.
pub fn normalize_bulk_prices(tiers: &mut [BulkPrice]) -> Result<(), CatalogError> {
    tiers.sort_by_key(|tier| tier.min_quantity);

    for pair in tiers.windows(2) {
        if pair[0].min_quantity == pair[1].min_quantity {
            return Err(CatalogError::DuplicateTier(pair[0].min_quantity));
        }
    }

    for tier in tiers.iter() {
        if tier.min_quantity == 0 {
            return Err(CatalogError::ZeroTierQuantity);
        }
        if tier.price < Decimal::ZERO {
            return Err(CatalogError::NegativeAmount { field: "bulkPrices.price" });
        }
    }

    Ok(())
}

fn validate_decant_options(options: &DecantOptions) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for entry in &options.sizes {
        if !seen.insert(entry.size.as_str()) {
            return Err(CatalogError::DuplicateDecantSize(entry.size.clone()));
        }
        if entry.price < Decimal::ZERO {
            return Err(CatalogError::NegativeAmount { field: "decantOptions.sizes.price" });
        }
    }
    Ok(())
}

fn non_negative(field: &'static str, amount: Option<Decimal>) -> Result<(), CatalogError> {
    match amount {
        Some(value) if value < Decimal::ZERO => Err(CatalogError::NegativeAmount { field }),
        _ => Ok(()),
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, CatalogError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(CatalogError::MissingField(field))
}

impl Product {
    /// Builds a new product from a create payload, deriving the slug when none
    /// is supplied and normalizing bulk tiers.
    pub fn from_new(data: NewProduct, now: DateTime<Utc>) -> Result<Self, CatalogError> {
        let name = required_text("name", data.name)?;
        let sku = required_text("sku", data.sku)?;
        let category = required_text("category", data.category)?;
        let retail_price = data.retail_price.ok_or(CatalogError::MissingField("retailPrice"))?;

        let slug = match data.slug.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()) {
            Some(slug) => slug,
            None => slugify(&name),
        };
        if slug.is_empty() {
            return Err(CatalogError::EmptySlug(name));
        }

        let mut product = Self {
            id: Uuid::new_v4(),
            name,
            slug,
            description: data.description.unwrap_or_default(),
            sku,
            retail_price,
            card_price: data.card_price,
            exclusive_price: data.exclusive_price,
            stock: data.stock.unwrap_or(0),
            category,
            images: data.images.unwrap_or_default(),
            bulk_prices: data.bulk_prices.unwrap_or_default(),
            sell_type: data.sell_type,
            decant_options: data.decant_options,
            is_active: data.is_active.unwrap_or(true),
            is_exclusive: data.is_exclusive.unwrap_or(false),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Returns a copy with the whitelisted fields of `patch` applied. A name
    /// change regenerates the slug. `self` is left untouched so a failed
    /// validation never leaks a half-applied update.
    pub fn patched(&self, patch: ProductPatch, now: DateTime<Utc>) -> Result<Self, CatalogError> {
        let mut next = self.clone();

        if let Some(name) = patch.name {
            let name = required_text("name", Some(name))?;
            if name != next.name {
                let slug = slugify(&name);
                if slug.is_empty() {
                    return Err(CatalogError::EmptySlug(name));
                }
                next.slug = slug;
                next.name = name;
            }
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(sku) = patch.sku {
            next.sku = required_text("sku", Some(sku))?;
        }
        if let Some(price) = patch.retail_price {
            next.retail_price = price;
        }
        if let Some(card_price) = patch.card_price {
            next.card_price = card_price;
        }
        if let Some(exclusive_price) = patch.exclusive_price {
            next.exclusive_price = exclusive_price;
        }
        if let Some(stock) = patch.stock {
            next.stock = stock;
        }
        if let Some(category) = patch.category {
            next.category = required_text("category", Some(category))?;
        }
        if let Some(images) = patch.images {
            next.images = images;
        }
        if let Some(tiers) = patch.bulk_prices {
            next.bulk_prices = tiers;
        }
        if let Some(active) = patch.is_active {
            next.is_active = active;
        }
        if let Some(exclusive) = patch.is_exclusive {
            next.is_exclusive = exclusive;
        }
        if let Some(sell_type) = patch.sell_type {
            next.sell_type = sell_type;
        }
        if let Some(decant_options) = patch.decant_options {
            next.decant_options = decant_options;
        }

        next.validate()?;
        next.updated_at = now;
        Ok(next)
    }

    /// Checks field ranges and normalizes the tier list in place.
    pub fn validate(&mut self) -> Result<(), CatalogError> {
        non_negative("retailPrice", Some(self.retail_price))?;
        non_negative("cardPrice", self.card_price)?;
        non_negative("exclusivePrice", self.exclusive_price)?;
        normalize_bulk_prices(&mut self.bulk_prices)?;
        if let Some(options) = &self.decant_options {
            validate_decant_options(options)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload() -> NewProduct {
        NewProduct {
            name: Some("Chanel N°5 Eau de Parfum!".to_string()),
            sku: Some("CH-005".to_string()),
            retail_price: Some(dec!(100)),
            category: Some("Mujer".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Chanel N°5 Eau de Parfum!"), "chanel-n-5-eau-de-parfum");
        assert_eq!(slugify("  --Dior   Sauvage--  "), "dior-sauvage");
        assert_eq!(slugify("Acqua di Giò"), "acqua-di-gi");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_from_new_derives_slug_and_defaults() {
        let product = Product::from_new(payload(), Utc::now()).unwrap();
        assert_eq!(product.slug, "chanel-n-5-eau-de-parfum");
        assert!(product.is_active);
        assert!(!product.is_deleted);
        assert!(!product.is_exclusive);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_from_new_keeps_supplied_slug() {
        let mut data = payload();
        data.slug = Some(" No5-Classic ".to_string());
        let product = Product::from_new(data, Utc::now()).unwrap();
        assert_eq!(product.slug, "no5-classic");
    }

    #[test]
    fn test_from_new_missing_fields() {
        let mut data = payload();
        data.sku = None;
        assert_eq!(
            Product::from_new(data, Utc::now()).unwrap_err(),
            CatalogError::MissingField("sku")
        );

        let mut data = payload();
        data.retail_price = None;
        assert_eq!(
            Product::from_new(data, Utc::now()).unwrap_err(),
            CatalogError::MissingField("retailPrice")
        );

        let mut data = payload();
        data.category = Some("   ".to_string());
        assert_eq!(
            Product::from_new(data, Utc::now()).unwrap_err(),
            CatalogError::MissingField("category")
        );
    }

    #[test]
    fn test_bulk_prices_sorted_on_create() {
        let mut data = payload();
        data.bulk_prices = Some(vec![
            BulkPrice { min_quantity: 10, price: dec!(80) },
            BulkPrice { min_quantity: 5, price: dec!(90) },
        ]);
        let product = Product::from_new(data, Utc::now()).unwrap();
        let thresholds: Vec<u32> = product.bulk_prices.iter().map(|t| t.min_quantity).collect();
        assert_eq!(thresholds, vec![5, 10]);
    }

    #[test]
    fn test_duplicate_tiers_rejected() {
        let mut data = payload();
        data.bulk_prices = Some(vec![
            BulkPrice { min_quantity: 5, price: dec!(90) },
            BulkPrice { min_quantity: 10, price: dec!(80) },
            BulkPrice { min_quantity: 5, price: dec!(85) },
        ]);
        assert_eq!(
            Product::from_new(data, Utc::now()).unwrap_err(),
            CatalogError::DuplicateTier(5)
        );
    }

    #[test]
    fn test_duplicate_decant_sizes_rejected() {
        let mut data = payload();
        data.decant_options = Some(DecantOptions {
            sizes: vec![
                DecantSize { size: "5ml".to_string(), price: dec!(12), stock: 3 },
                DecantSize { size: "5ml".to_string(), price: dec!(11), stock: 1 },
            ],
        });
        assert!(matches!(
            Product::from_new(data, Utc::now()),
            Err(CatalogError::DuplicateDecantSize(_))
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut data = payload();
        data.card_price = Some(dec!(-1));
        assert_eq!(
            Product::from_new(data, Utc::now()).unwrap_err(),
            CatalogError::NegativeAmount { field: "cardPrice" }
        );
    }

    #[test]
    fn test_patch_regenerates_slug_and_keeps_original() {
        let product = Product::from_new(payload(), Utc::now()).unwrap();
        let patch = ProductPatch {
            name: Some("Coco Mademoiselle".to_string()),
            stock: Some(7),
            ..Default::default()
        };
        let updated = product.patched(patch, Utc::now()).unwrap();
        assert_eq!(updated.slug, "coco-mademoiselle");
        assert_eq!(updated.stock, 7);
        assert_eq!(updated.id, product.id);
        assert_eq!(product.slug, "chanel-n-5-eau-de-parfum");
    }

    #[test]
    fn test_patch_with_duplicate_tiers_fails() {
        let product = Product::from_new(payload(), Utc::now()).unwrap();
        let patch = ProductPatch {
            bulk_prices: Some(vec![
                BulkPrice { min_quantity: 3, price: dec!(95) },
                BulkPrice { min_quantity: 3, price: dec!(90) },
            ]),
            ..Default::default()
        };
        assert_eq!(
            product.patched(patch, Utc::now()).unwrap_err(),
            CatalogError::DuplicateTier(3)
        );
    }

    #[test]
    fn test_patch_ignores_non_whitelisted_fields() {
        let product = Product::from_new(payload(), Utc::now()).unwrap();
        let patch: ProductPatch = serde_json::from_value(serde_json::json!({
            "slug": "hijacked",
            "isDeleted": true,
            "stock": 4
        }))
        .unwrap();
        let updated = product.patched(patch, Utc::now()).unwrap();
        assert_eq!(updated.slug, product.slug);
        assert!(!updated.is_deleted);
        assert_eq!(updated.stock, 4);
    }

    #[test]
    fn test_patch_null_clears_optional_fields() {
        let mut data = payload();
        data.card_price = Some(dec!(5));
        data.exclusive_price = Some(dec!(70));
        data.sell_type = Some(SellType::Both);
        data.decant_options = Some(DecantOptions {
            sizes: vec![DecantSize { size: "5ml".to_string(), price: dec!(12), stock: 3 }],
        });
        let product = Product::from_new(data, Utc::now()).unwrap();

        let patch: ProductPatch = serde_json::from_value(serde_json::json!({
            "cardPrice": null,
            "sellType": null,
            "decantOptions": null
        }))
        .unwrap();
        let updated = product.patched(patch, Utc::now()).unwrap();
        assert_eq!(updated.card_price, None);
        assert_eq!(updated.sell_type, None);
        assert_eq!(updated.decant_options, None);
        assert_eq!(updated.exclusive_price, Some(dec!(70)));
    }

    #[test]
    fn test_patch_sets_optional_fields() {
        let product = Product::from_new(payload(), Utc::now()).unwrap();
        let patch: ProductPatch = serde_json::from_value(serde_json::json!({
            "cardPrice": 95,
            "sellType": "decant"
        }))
        .unwrap();
        assert_eq!(patch.exclusive_price, None);

        let updated = product.patched(patch, Utc::now()).unwrap();
        assert_eq!(updated.card_price, Some(dec!(95)));
        assert_eq!(updated.sell_type, Some(SellType::Decant));
    }

    #[test]
    fn test_product_wire_format() {
        let product = Product::from_new(payload(), Utc::now()).unwrap();
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["retailPrice"], serde_json::json!(100.0));
        assert_eq!(value["isActive"], serde_json::json!(true));
        assert!(value.get("retail_price").is_none());
    }
}
