use crate::product::Product;

/// Stock of a decant size; zero when the product has no such size.
pub fn resolve_decant_stock(product: &Product, size: &str) -> u32 {
    product
        .decant_options
        .as_ref()
        .and_then(|options| options.sizes.iter().find(|entry| entry.size == size))
        .map(|entry| entry.stock)
        .unwrap_or(0)
}

/// Units available for a purchase: decant stock when a size is given,
/// bottle stock otherwise.
pub fn available_units(product: &Product, size: Option<&str>) -> u32 {
    match size {
        Some(size) => resolve_decant_stock(product, size),
        None => product.stock,
    }
}

/// Fails when fewer than `quantity` bottles are in stock. Nothing is reserved.
pub fn ensure_available(product: &Product, quantity: u32) -> Result<(), InventoryError> {
    if product.stock < quantity {
        return Err(InventoryError::InsufficientInventory {
            product: product.name.clone(),
            requested: quantity,
            available: product.stock,
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientInventory {
        product: String,
        requested: u32,
        available: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{DecantOptions, DecantSize, NewProduct};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product_with_stock(stock: u32) -> Product {
        Product::from_new(
            NewProduct {
                name: Some("Light Blue".to_string()),
                sku: Some("DG-LB".to_string()),
                retail_price: Some(dec!(60)),
                category: Some("Mujer".to_string()),
                stock: Some(stock),
                decant_options: Some(DecantOptions {
                    sizes: vec![DecantSize { size: "5ml".to_string(), price: dec!(9), stock: 12 }],
                }),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_decant_stock_lookup() {
        let mut product = product_with_stock(3);
        assert_eq!(resolve_decant_stock(&product, "5ml"), 12);
        assert_eq!(resolve_decant_stock(&product, "10ml"), 0);
        assert_eq!(available_units(&product, None), 3);
        assert_eq!(available_units(&product, Some("5ml")), 12);

        product.decant_options = None;
        assert_eq!(resolve_decant_stock(&product, "5ml"), 0);
    }

    #[test]
    fn test_ensure_available() {
        let product = product_with_stock(2);
        assert!(ensure_available(&product, 2).is_ok());

        let err = ensure_available(&product, 3).unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientInventory {
                product: "Light Blue".to_string(),
                requested: 3,
                available: 2,
            }
        );
    }
}
