use crate::{
    commands::Command,
    db::DbPool,
    entities::product,
    errors::ServiceError,
    services::product_catalog_service::{NewProduct, ProductCatalogService},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

fn default_active() -> bool {
    true
}

/// `POST /api/v1/products`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductCommand {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    /// Derived from the name when omitted.
    #[validate(length(min = 1, max = 200, message = "Slug must be 1-200 characters"))]
    pub slug: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[async_trait::async_trait]
impl Command for CreateProductCommand {
    type Result = product::Model;

    #[instrument(skip(self, db_pool), fields(name = %self.name))]
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ProductCatalogService::new(db_pool)
            .create_product(NewProduct {
                name: self.name.trim().to_string(),
                slug: self.slug.clone(),
                description: self.description.clone(),
                is_active: self.is_active,
            })
            .await
    }
}
