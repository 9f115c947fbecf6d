use std::sync::Arc;

use crate::{
    db::{with_transaction, DbPool},
    entities::{
        inventory_log::{self, InventoryLogType},
        product::{self, Entity as Product},
        product_variant::{self, Entity as ProductVariant},
    },
    errors::ServiceError,
    metrics,
    services::inventory_adjustment_service::{apply_adjustment, AdjustmentRequest},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Note on the ledger entry that seeds a new variant's stock.
pub const INITIAL_STOCK_NOTE: &str = "Initial stock";

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewVariant {
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub initial_stock: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedVariant {
    pub variant: product_variant::Model,
    /// Present when the variant was created with stock on hand.
    pub initial_log: Option<inventory_log::Model>,
}

/// Lowercase, hyphen separated form of a product name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

async fn insert_variant<C>(
    conn: &C,
    product_id: Uuid,
    new: &NewVariant,
) -> Result<CreatedVariant, ServiceError>
where
    C: ConnectionTrait,
{
    if Product::find_by_id(product_id).one(conn).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "Product {} not found",
            product_id
        )));
    }

    let duplicate = ProductVariant::find()
        .filter(product_variant::Column::Sku.eq(new.sku.as_str()))
        .one(conn)
        .await?;
    if duplicate.is_some() {
        return Err(ServiceError::ValidationError(format!(
            "Variant with SKU '{}' already exists",
            new.sku
        )));
    }

    let now = Utc::now();
    let variant = product_variant::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        sku: Set(new.sku.clone()),
        name: Set(new.name.clone()),
        stock: Set(0),
        price: Set(new.price),
        compare_at_price: Set(new.compare_at_price),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    if new.initial_stock == 0 {
        return Ok(CreatedVariant {
            variant,
            initial_log: None,
        });
    }

    // Seed stock through the ledger so the log sum matches from the start.
    let seed = AdjustmentRequest::new(variant.id, new.initial_stock, InventoryLogType::Restock)
        .with_note(INITIAL_STOCK_NOTE);
    let applied = apply_adjustment(conn, &seed).await?;

    Ok(CreatedVariant {
        variant: applied.variant,
        initial_log: Some(applied.log),
    })
}

/// Catalog writes needed to hold stock: products and their variants.
#[derive(Clone)]
pub struct ProductCatalogService {
    db_pool: Arc<DbPool>,
}

impl ProductCatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_product(&self, new: NewProduct) -> Result<product::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let slug = match new.slug.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => slugify(&new.name),
        };
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product slug cannot be empty".to_string(),
            ));
        }

        let existing = Product::find()
            .filter(product::Column::Slug.eq(slug.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Product with slug '{}' already exists",
                slug
            )));
        }

        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name),
            slug: Set(slug),
            description: Set(new.description),
            is_active: Set(new.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    /// Creates a variant with zero stock, then records any initial stock as a
    /// RESTOCK entry in the same transaction.
    #[instrument(skip(self, new), fields(product_id = %product_id, sku = %new.sku))]
    pub async fn create_variant(
        &self,
        product_id: Uuid,
        new: NewVariant,
    ) -> Result<CreatedVariant, ServiceError> {
        if new.initial_stock < 0 {
            return Err(ServiceError::ValidationError(
                "Initial stock cannot be negative".to_string(),
            ));
        }

        let created = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move { insert_variant(txn, product_id, &new).await })
        })
        .await?;

        if created.initial_log.is_some() {
            metrics::record_adjustment_applied(InventoryLogType::Restock);
        }
        info!(
            variant_id = %created.variant.id,
            stock = created.variant.stock,
            "Variant created"
        );
        Ok(created)
    }

    pub async fn get_variant(&self, variant_id: Uuid) -> Result<product_variant::Model, ServiceError> {
        ProductVariant::find_by_id(variant_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product variant {} not found", variant_id))
            })
    }
}
