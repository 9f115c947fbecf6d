use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    services::product_catalog_service::{CreatedVariant, NewVariant, ProductCatalogService},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        let mut err = ValidationError::new("price");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

/// `POST /api/v1/products/{id}/variants`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateVariantCommand {
    #[serde(skip)]
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 64, message = "SKU must be 1-64 characters"))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    /// Recorded as a RESTOCK ledger entry.
    #[serde(default)]
    #[validate(range(min = 0, message = "Initial stock cannot be negative"))]
    pub initial_stock: i32,
}

impl CreateVariantCommand {
    pub fn for_product(mut self, product_id: Uuid) -> Self {
        self.product_id = product_id;
        self
    }
}

#[async_trait::async_trait]
impl Command for CreateVariantCommand {
    type Result = CreatedVariant;

    #[instrument(skip(self, db_pool), fields(product_id = %self.product_id, sku = %self.sku))]
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ProductCatalogService::new(db_pool)
            .create_variant(
                self.product_id,
                NewVariant {
                    sku: self.sku.trim().to_string(),
                    name: self.name.clone(),
                    price: self.price,
                    compare_at_price: self.compare_at_price,
                    initial_stock: self.initial_stock,
                },
            )
            .await
    }
}
