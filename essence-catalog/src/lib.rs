pub mod product;
pub mod pricing;
pub mod inventory;
pub mod combo;

pub use product::{
    slugify, BulkPrice, CatalogError, DecantOptions, DecantSize, NewProduct, Product, ProductPatch,
    SellType,
};
pub use pricing::{quote, resolve_bulk_price, resolve_decant_price, PriceQuote, PriceRequest, PriceSource};
pub use inventory::{available_units, ensure_available, resolve_decant_stock, InventoryError};
pub use combo::{Combo, ComboItem, ComboPatch, ComboPrices, NewCombo};
