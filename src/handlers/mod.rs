use std::sync::Arc;

use crate::{
    db::DbPool,
    services::{orders::OrderService, product_catalog_service::ProductCatalogService},
};

pub mod common;
pub mod inventory;
pub mod orders;
pub mod products;

/// Read-side services used directly by handlers; writes go through commands.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub product_catalog: Arc<ProductCatalogService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            orders: Arc::new(OrderService::new(db_pool.clone())),
            product_catalog: Arc::new(ProductCatalogService::new(db_pool)),
        }
    }
}
