use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One component of a combo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComboItem {
    /// Referenced product id
    pub product: Uuid,
    pub quantity: u32,
}

/// A bundle of products sold at an aggregated price.
///
/// `base_price`, `final_price` and `final_price_with_card` are derived from
/// `products` and are recomputed whenever the component list changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Combo {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub products: Vec<ComboItem>,
    pub base_price: Decimal,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    pub final_price: Decimal,
    pub final_price_with_card: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCombo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub products: Vec<ComboItem>,
    pub discount_percentage: Option<Decimal>,
    /// Explicit final price; replaces the discounted base price
    pub final_price: Option<Decimal>,
    /// Explicit card price; replaces the surcharged final price
    pub final_price_with_card: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub products: Option<Vec<ComboItem>>,
    pub discount_percentage: Option<Decimal>,
    pub final_price: Option<Decimal>,
    pub final_price_with_card: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Derived prices of a combo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboPrices {
    pub base_price: Decimal,
    pub final_price: Decimal,
    pub final_price_with_card: Decimal,
}

impl Combo {
    pub fn apply_prices(&mut self, prices: ComboPrices) {
        self.base_price = prices.base_price;
        self.final_price = prices.final_price;
        self.final_price_with_card = prices.final_price_with_card;
    }
}
