use std::collections::HashMap;
use std::sync::Arc;

use essence_catalog::{ensure_available, ComboItem, ComboPrices};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;
use uuid::Uuid;

use crate::repository::ProductRepository;
use crate::{CoreError, CoreResult};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Pricing policy for combos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboPricing {
    /// Surcharge applied to the final price when paying by card, in percent
    pub card_surcharge_percentage: Decimal,
}

impl Default for ComboPricing {
    fn default() -> Self {
        Self {
            card_surcharge_percentage: Decimal::TEN,
        }
    }
}

/// Price inputs supplied by the caller alongside the component list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceInputs {
    pub discount_percentage: Option<Decimal>,
    pub final_price: Option<Decimal>,
    pub final_price_with_card: Option<Decimal>,
}

fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn out_of_range(field: &str) -> CoreError {
    CoreError::ValidationError(format!("{field} exceeds the supported amount range"))
}

/// Checks caller-supplied price inputs before any product is fetched.
pub fn validate_inputs(inputs: &PriceInputs) -> CoreResult<()> {
    if let Some(discount) = inputs.discount_percentage {
        if discount < Decimal::ZERO || discount > HUNDRED {
            return Err(CoreError::ValidationError(format!(
                "discountPercentage must be between 0 and 100, got {discount}"
            )));
        }
    }
    for (field, amount) in [
        ("finalPrice", inputs.final_price),
        ("finalPriceWithCard", inputs.final_price_with_card),
    ] {
        if amount.is_some_and(|value| value < Decimal::ZERO) {
            return Err(CoreError::ValidationError(format!("{field} must not be negative")));
        }
    }
    Ok(())
}

/// Aggregates `(retail price, quantity)` pairs into combo prices.
///
/// Caller overrides win; otherwise the discount is applied to the base price
/// and the card surcharge to the final price. Totals beyond the decimal
/// range are rejected.
pub fn price_components(
    components: &[(Decimal, u32)],
    inputs: &PriceInputs,
    policy: &ComboPricing,
) -> CoreResult<ComboPrices> {
    let base_price = components
        .iter()
        .try_fold(Decimal::ZERO, |sum, (unit_price, quantity)| {
            unit_price
                .checked_mul(Decimal::from(*quantity))
                .and_then(|line| sum.checked_add(line))
        })
        .ok_or_else(|| out_of_range("basePrice"))?;

    let final_price = match (inputs.final_price, inputs.discount_percentage) {
        (Some(price), _) => price,
        (None, Some(discount)) => base_price
            .checked_mul(Decimal::ONE - discount / HUNDRED)
            .map(round_money)
            .ok_or_else(|| out_of_range("finalPrice"))?,
        (None, None) => base_price,
    };

    let final_price_with_card = match inputs.final_price_with_card {
        Some(price) => price,
        None => final_price
            .checked_mul(Decimal::ONE + policy.card_surcharge_percentage / HUNDRED)
            .map(round_money)
            .ok_or_else(|| out_of_range("finalPriceWithCard"))?,
    };

    Ok(ComboPrices {
        base_price,
        final_price,
        final_price_with_card,
    })
}

/// Resolves combo components against the product catalog and prices them.
#[derive(Clone)]
pub struct ComboPriceCalculator {
    products: Arc<dyn ProductRepository>,
    policy: ComboPricing,
}

impl ComboPriceCalculator {
    pub fn new(products: Arc<dyn ProductRepository>, policy: ComboPricing) -> Self {
        Self { products, policy }
    }

    /// Validates every component (exists, not deleted, enough stock) and
    /// returns the derived prices. Bulk tiers never apply inside a combo, and
    /// repeated entries for one product are checked against its stock together.
    pub async fn calculate(&self, items: &[ComboItem], inputs: &PriceInputs) -> CoreResult<ComboPrices> {
        if items.is_empty() {
            return Err(CoreError::ValidationError(
                "A combo must contain at least one product".to_string(),
            ));
        }
        validate_inputs(inputs)?;

        let mut components = Vec::with_capacity(items.len());
        let mut requested: HashMap<Uuid, u32> = HashMap::new();
        for item in items {
            if item.quantity == 0 {
                return Err(CoreError::ValidationError(format!(
                    "Quantity for product {} must be at least 1",
                    item.product
                )));
            }

            let product = self
                .products
                .get_product(item.product)
                .await?
                .filter(|product| !product.is_deleted)
                .ok_or_else(|| CoreError::NotFoundError(format!("Product {} not found", item.product)))?;

            let total = requested.entry(product.id).or_default();
            *total = total.checked_add(item.quantity).ok_or_else(|| {
                CoreError::ValidationError(format!("Quantity for product {} is too large", item.product))
            })?;
            ensure_available(&product, *total)?;
            components.push((product.retail_price, item.quantity));
        }

        let prices = price_components(&components, inputs, &self.policy)?;
        debug!(
            "Combo priced: base {} final {} card {}",
            prices.base_price, prices.final_price, prices.final_price_with_card
        );
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_discounted_combo() {
        let inputs = PriceInputs {
            discount_percentage: Some(dec!(10)),
            ..Default::default()
        };
        let prices = price_components(&[(dec!(50), 2), (dec!(30), 1)], &inputs, &ComboPricing::default()).unwrap();
        assert_eq!(prices.base_price, dec!(130));
        assert_eq!(prices.final_price, dec!(117));
        assert_eq!(prices.final_price_with_card, dec!(128.7));
    }

    #[test]
    fn test_no_discount_keeps_base() {
        let prices = price_components(&[(dec!(45.5), 2)], &PriceInputs::default(), &ComboPricing::default()).unwrap();
        assert_eq!(prices.base_price, dec!(91));
        assert_eq!(prices.final_price, dec!(91));
        assert_eq!(prices.final_price_with_card, dec!(100.1));
    }

    #[test]
    fn test_overrides_win() {
        let inputs = PriceInputs {
            discount_percentage: Some(dec!(50)),
            final_price: Some(dec!(99)),
            final_price_with_card: Some(dec!(101)),
        };
        let prices = price_components(&[(dec!(100), 1)], &inputs, &ComboPricing::default()).unwrap();
        assert_eq!(prices.base_price, dec!(100));
        assert_eq!(prices.final_price, dec!(99));
        assert_eq!(prices.final_price_with_card, dec!(101));
    }

    #[test]
    fn test_card_price_follows_final_override() {
        let inputs = PriceInputs {
            final_price: Some(dec!(80)),
            ..Default::default()
        };
        let prices = price_components(&[(dec!(100), 1)], &inputs, &ComboPricing::default()).unwrap();
        assert_eq!(prices.final_price_with_card, dec!(88));
    }

    #[test]
    fn test_rounding_to_cents() {
        let inputs = PriceInputs {
            discount_percentage: Some(dec!(33.33)),
            ..Default::default()
        };
        let prices = price_components(&[(dec!(10), 1)], &inputs, &ComboPricing::default()).unwrap();
        assert_eq!(prices.final_price, dec!(6.67));
        assert_eq!(prices.final_price_with_card, dec!(7.34));
    }

    #[test]
    fn test_custom_surcharge() {
        let policy = ComboPricing {
            card_surcharge_percentage: dec!(5),
        };
        let prices = price_components(&[(dec!(200), 1)], &PriceInputs::default(), &policy).unwrap();
        assert_eq!(prices.final_price_with_card, dec!(210));
    }

    #[test]
    fn test_base_price_overflow_is_rejected() {
        let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        let result = price_components(&[(huge, 4_000_000_000)], &PriceInputs::default(), &ComboPricing::default());
        assert!(matches!(result, Err(CoreError::ValidationError(_))));

        let result = price_components(
            &[(Decimal::MAX, 1), (Decimal::MAX, 1)],
            &PriceInputs::default(),
            &ComboPricing::default(),
        );
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_card_surcharge_overflow_is_rejected() {
        let inputs = PriceInputs {
            final_price: Some(Decimal::MAX),
            ..Default::default()
        };
        let result = price_components(&[(dec!(10), 1)], &inputs, &ComboPricing::default());
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_discount_out_of_range() {
        let inputs = PriceInputs {
            discount_percentage: Some(dec!(120)),
            ..Default::default()
        };
        assert!(matches!(validate_inputs(&inputs), Err(CoreError::ValidationError(_))));
    }
}
