use crate::{
    db::{with_transaction, DbPool},
    entities::{
        inventory_log::{self, Entity as InventoryLog, InventoryLogType},
        product_variant::{self, Entity as ProductVariant},
    },
    errors::ServiceError,
    metrics,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Longest note accepted on a ledger entry.
pub const MAX_NOTE_LENGTH: usize = 500;
/// Largest batch accepted by `bulk_adjust`.
pub const MAX_BULK_ITEMS: usize = 500;

/// One signed stock delta for a single variant.
#[derive(Debug, Clone)]
pub struct AdjustmentRequest {
    pub variant_id: Uuid,
    pub change: i32,
    pub log_type: InventoryLogType,
    pub note: Option<String>,
    pub order_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
}

impl AdjustmentRequest {
    pub fn new(variant_id: Uuid, change: i32, log_type: InventoryLogType) -> Self {
        Self {
            variant_id,
            change,
            log_type,
            note: None,
            order_id: None,
            admin_id: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_order(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_admin(mut self, admin_id: Option<Uuid>) -> Self {
        self.admin_id = admin_id;
        self
    }

    /// Input checks that need no database access.
    pub fn check(&self) -> Result<(), ServiceError> {
        check_change(self.change)?;
        check_note(self.note.as_deref())
    }
}

/// The variant after the delta, together with the ledger entry that records it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppliedAdjustment {
    pub variant: product_variant::Model,
    pub log: inventory_log::Model,
}

/// Stock level after applying `change`, or `None` if it would be negative or overflow.
pub fn checked_stock(current: i32, change: i32) -> Option<i32> {
    current.checked_add(change).filter(|stock| *stock >= 0)
}

fn check_change(change: i32) -> Result<(), ServiceError> {
    if change == 0 {
        return Err(ServiceError::ValidationError(
            "Stock change must be nonzero".to_string(),
        ));
    }
    // The guard compares stock against -change.
    if change.checked_neg().is_none() {
        return Err(ServiceError::ValidationError(format!(
            "Stock change {} is out of range",
            change
        )));
    }
    Ok(())
}

fn check_note(note: Option<&str>) -> Result<(), ServiceError> {
    match note {
        Some(text) if text.chars().count() > MAX_NOTE_LENGTH => Err(ServiceError::ValidationError(
            format!("Note must be at most {} characters", MAX_NOTE_LENGTH),
        )),
        _ => Ok(()),
    }
}

/// Applies one delta on the given connection, normally an open transaction.
///
/// The stock update is a single conditional `UPDATE ... SET stock = stock + change
/// WHERE id = ? AND stock >= -change`, so concurrent writers to the same variant are
/// serialized by the row lock and never both act on a stale count. The ledger entry
/// is only written when the update matched.
pub async fn apply_adjustment<C>(
    conn: &C,
    request: &AdjustmentRequest,
) -> Result<AppliedAdjustment, ServiceError>
where
    C: ConnectionTrait,
{
    request.check()?;
    let now = Utc::now();

    let update = ProductVariant::update_many()
        .col_expr(
            product_variant::Column::Stock,
            Expr::col(product_variant::Column::Stock).add(request.change),
        )
        .col_expr(product_variant::Column::UpdatedAt, Expr::value(now))
        .filter(product_variant::Column::Id.eq(request.variant_id))
        .filter(product_variant::Column::Stock.gte(-request.change))
        .exec(conn)
        .await?;

    if update.rows_affected == 0 {
        return Err(rejection(conn, request).await?);
    }

    let variant = ProductVariant::find_by_id(request.variant_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Variant {} disappeared after stock update",
                request.variant_id
            ))
        })?;

    // The matched update holds the variant's row lock, so the next position is ours.
    let sequence = InventoryLog::find()
        .filter(inventory_log::Column::VariantId.eq(variant.id))
        .order_by_desc(inventory_log::Column::Sequence)
        .one(conn)
        .await?
        .map_or(1, |last| last.sequence + 1);

    let log = inventory_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        variant_id: Set(variant.id),
        sequence: Set(sequence),
        change: Set(request.change),
        resulting_stock: Set(variant.stock),
        log_type: Set(request.log_type),
        note: Set(request.note.clone()),
        order_id: Set(request.order_id),
        admin_id: Set(request.admin_id),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    info!(
        variant_id = %variant.id,
        sku = %variant.sku,
        change = request.change,
        resulting_stock = variant.stock,
        log_type = %request.log_type,
        "Stock adjusted"
    );

    Ok(AppliedAdjustment { variant, log })
}

/// Works out why the guarded update matched nothing.
async fn rejection<C>(conn: &C, request: &AdjustmentRequest) -> Result<ServiceError, ServiceError>
where
    C: ConnectionTrait,
{
    match ProductVariant::find_by_id(request.variant_id).one(conn).await? {
        None => {
            warn!(variant_id = %request.variant_id, "Adjustment rejected: variant not found");
            metrics::record_adjustment_rejected(SkipReason::VariantNotFound.as_str());
            Ok(ServiceError::NotFound(format!(
                "Product variant {} not found",
                request.variant_id
            )))
        }
        Some(variant) => {
            warn!(
                variant_id = %variant.id,
                stock = variant.stock,
                change = request.change,
                "Adjustment rejected: insufficient stock"
            );
            metrics::record_adjustment_rejected(SkipReason::InsufficientStock.as_str());
            Ok(ServiceError::InsufficientStock(format!(
                "variant {} has {} units, cannot apply change of {}",
                variant.sku, variant.stock, request.change
            )))
        }
    }
}

/// One entry of a bulk adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkAdjustmentItem {
    pub variant_id: Uuid,
    pub change: i32,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    VariantNotFound,
    InsufficientStock,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VariantNotFound => "variant_not_found",
            Self::InsufficientStock => "insufficient_stock",
        }
    }
}

/// A bulk item that was not applied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkippedAdjustment {
    /// Position of the item in the submitted batch.
    pub index: usize,
    pub variant_id: Uuid,
    pub change: i32,
    pub reason: SkipReason,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkAdjustmentResult {
    /// Number of items applied.
    pub updated: usize,
    pub applied: Vec<AppliedAdjustment>,
    pub skipped: Vec<SkippedAdjustment>,
}

/// Validates a whole batch up front so that nothing is persisted for a malformed request.
pub fn check_bulk_items(items: &[BulkAdjustmentItem]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "Bulk adjustment requires at least one item".to_string(),
        ));
    }
    if items.len() > MAX_BULK_ITEMS {
        return Err(ServiceError::ValidationError(format!(
            "Bulk adjustment accepts at most {} items",
            MAX_BULK_ITEMS
        )));
    }
    for (index, item) in items.iter().enumerate() {
        check_change(item.change)
            .and_then(|_| check_note(item.note.as_deref()))
            .map_err(|e| match e {
                ServiceError::ValidationError(msg) => {
                    ServiceError::ValidationError(format!("Item {}: {}", index, msg))
                }
                other => other,
            })?;
    }
    Ok(())
}

/// Service for applying stock adjustments to product variants
#[derive(Clone)]
pub struct InventoryAdjustmentService {
    db_pool: Arc<DbPool>,
}

impl InventoryAdjustmentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Applies a single delta atomically.
    #[instrument(skip(self, request), fields(variant_id = %request.variant_id, change = request.change))]
    pub async fn adjust(&self, request: AdjustmentRequest) -> Result<AppliedAdjustment, ServiceError> {
        request.check()?;
        let log_type = request.log_type;

        let applied = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move { apply_adjustment(txn, &request).await })
        })
        .await?;

        metrics::record_adjustment_applied(log_type);
        Ok(applied)
    }

    /// Applies a batch in order inside one transaction, skipping items whose variant
    /// is missing or whose delta would drive stock negative. Any other failure
    /// rolls back the whole batch.
    #[instrument(skip(self, items), fields(items = items.len(), log_type = %log_type))]
    pub async fn bulk_adjust(
        &self,
        items: Vec<BulkAdjustmentItem>,
        log_type: InventoryLogType,
        admin_id: Option<Uuid>,
    ) -> Result<BulkAdjustmentResult, ServiceError> {
        check_bulk_items(&items)?;

        let result = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let mut applied = Vec::with_capacity(items.len());
                let mut skipped = Vec::new();

                for (index, item) in items.into_iter().enumerate() {
                    let request = AdjustmentRequest {
                        variant_id: item.variant_id,
                        change: item.change,
                        log_type,
                        note: item.note,
                        order_id: None,
                        admin_id,
                    };

                    let reason = match apply_adjustment(txn, &request).await {
                        Ok(done) => {
                            applied.push(done);
                            continue;
                        }
                        Err(ServiceError::NotFound(msg)) => (SkipReason::VariantNotFound, msg),
                        Err(ServiceError::InsufficientStock(msg)) => {
                            (SkipReason::InsufficientStock, msg)
                        }
                        Err(other) => return Err(other),
                    };

                    skipped.push(SkippedAdjustment {
                        index,
                        variant_id: request.variant_id,
                        change: request.change,
                        reason: reason.0,
                        message: reason.1,
                    });
                }

                Ok(BulkAdjustmentResult {
                    updated: applied.len(),
                    applied,
                    skipped,
                })
            })
        })
        .await?;

        for entry in &result.skipped {
            metrics::record_bulk_skip(entry.reason.as_str());
            warn!(
                index = entry.index,
                variant_id = %entry.variant_id,
                reason = entry.reason.as_str(),
                "Bulk adjustment item skipped"
            );
        }
        for _ in &result.applied {
            metrics::record_adjustment_applied(log_type);
        }

        info!(
            updated = result.updated,
            skipped = result.skipped.len(),
            "Bulk adjustment completed"
        );
        Ok(result)
    }
}
