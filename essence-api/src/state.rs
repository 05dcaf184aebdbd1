use std::time::Duration;

use essence_core::{CatalogService, ComboPriceCalculator, ComboPricing, ComboService};
use essence_store::app_config::Config;
use essence_store::Store;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub combos: ComboService,
    pub auth: AuthConfig,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires the services over an opened store using the loaded configuration.
    pub fn new(store: &Store, config: &Config) -> Self {
        let calculator = ComboPriceCalculator::new(
            store.products.clone(),
            ComboPricing {
                card_surcharge_percentage: config.pricing.card_surcharge_percentage,
            },
        );

        Self {
            catalog: CatalogService::new(store.products.clone())
                .with_page_size(config.pricing.default_page_size),
            combos: ComboService::new(store.combos.clone(), calculator),
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
            },
            request_timeout: Duration::from_secs(config.server.request_timeout_seconds),
        }
    }
}
