pub mod app_config;
pub mod database;
pub mod memory;
pub mod sql;
pub mod product_repo;
pub mod combo_repo;

use std::sync::Arc;

use essence_core::repository::{ComboRepository, ProductRepository};
use tracing::info;

use app_config::{DatabaseConfig, StoreBackend};
pub use combo_repo::PgComboRepository;
pub use database::DbClient;
pub use memory::MemoryStore;
pub use product_repo::PgProductRepository;

#[derive(Debug, thiserror::Error)]
pub enum StoreOpenError {
    #[error("database.url is required for the postgres backend")]
    MissingUrl,
    #[error("Database connection failed: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// An opened store: the repositories handed to services plus whatever must
/// be released at shutdown.
#[derive(Clone)]
pub struct Store {
    pub products: Arc<dyn ProductRepository>,
    pub combos: Arc<dyn ComboRepository>,
    db: Option<DbClient>,
}

impl Store {
    /// Backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        let memory = Arc::new(MemoryStore::new());
        Self {
            products: memory.clone(),
            combos: memory,
            db: None,
        }
    }

    pub async fn open(config: &DatabaseConfig) -> Result<Self, StoreOpenError> {
        match config.backend {
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Ok(Self::in_memory())
            }
            StoreBackend::Postgres => {
                let url = config.url.as_deref().ok_or(StoreOpenError::MissingUrl)?;
                let db = DbClient::new(url, config.max_connections).await?;
                db.migrate().await?;
                info!("Connected to PostgreSQL store");
                Ok(Self {
                    products: Arc::new(PgProductRepository::new(db.pool.clone())),
                    combos: Arc::new(PgComboRepository::new(db.pool.clone())),
                    db: Some(db),
                })
            }
        }
    }

    pub async fn close(&self) {
        if let Some(db) = &self.db {
            db.close().await;
        }
    }
}
