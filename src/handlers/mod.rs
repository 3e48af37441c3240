pub mod commerce;
pub mod common;
pub mod inventory;

use crate::{config::AppConfig, db::DbPool};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<crate::services::ProductService>,
    pub inventory: Arc<crate::services::InventoryService>,
    pub carts: Arc<crate::services::CartService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            products: Arc::new(crate::services::ProductService::new(db_pool.clone())),
            inventory: Arc::new(crate::services::InventoryService::new(
                db_pool.clone(),
                config.inventory_max_retries,
            )),
            carts: Arc::new(crate::services::CartService::new(
                db_pool,
                config.default_currency.clone(),
            )),
        }
    }
}
