use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::{with_transaction, DbPool},
    entities::{
        inventory_log::{self, InventoryLogType},
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, OrderStatus},
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    metrics,
    services::inventory_adjustment_service::{apply_adjustment, AdjustmentRequest},
};

/// Note written on restoration entries when the caller gives none.
pub const DEFAULT_CANCELLATION_NOTE: &str = "Order cancelled - stock returned";

/// A requested status change, with optional shipping and operator details.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub admin_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusChangeOutcome {
    pub order: order::Model,
    pub previous_status: OrderStatus,
    /// Ledger entries written to return stock, empty unless this call cancelled the order.
    pub restored: Vec<inventory_log::Model>,
}

/// Whether moving from `current` to `next` must return the order's stock.
pub fn restores_stock(current: OrderStatus, next: OrderStatus) -> bool {
    next == OrderStatus::Cancelled && current != OrderStatus::Cancelled
}

/// Takes the order's row lock by touching `updated_at`, so every later read in
/// the transaction sees the latest committed status. Fails with `NotFound` when
/// no row matched.
async fn lock_order<C>(conn: &C, order_id: Uuid) -> Result<order::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let touched = OrderEntity::update_many()
        .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(order::Column::Id.eq(order_id))
        .exec(conn)
        .await?;

    if touched.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!("Order {} not found", order_id)));
    }

    OrderEntity::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
}

/// Moves the order to `Cancelled` unless it already is. Only the caller whose
/// update matched may return stock.
async fn claim_cancellation<C>(conn: &C, order_id: Uuid) -> Result<bool, ServiceError>
where
    C: ConnectionTrait,
{
    let claimed = OrderEntity::update_many()
        .col_expr(order::Column::Status, Expr::value(OrderStatus::Cancelled))
        .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::Status.ne(OrderStatus::Cancelled))
        .exec(conn)
        .await?;

    Ok(claimed.rows_affected == 1)
}

/// Locks the order, restores stock on the first cancellation and persists the new
/// status, all on the caller's connection. Any failure leaves the order untouched
/// when the connection is a transaction.
pub async fn reconcile_status<C>(
    conn: &C,
    update: &StatusUpdate,
) -> Result<StatusChangeOutcome, ServiceError>
where
    C: ConnectionTrait,
{
    let order = lock_order(conn, update.order_id).await?;

    let previous_status = order.status;
    let mut restored = Vec::new();

    if restores_stock(previous_status, update.status)
        && claim_cancellation(conn, order.id).await?
    {
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(conn)
            .await?;

        let note = update
            .notes
            .clone()
            .unwrap_or_else(|| DEFAULT_CANCELLATION_NOTE.to_string());

        for item in items {
            let request = AdjustmentRequest::new(
                item.variant_id,
                item.quantity,
                InventoryLogType::OrderCancelled,
            )
            .with_note(note.clone())
            .with_order(order.id)
            .with_admin(update.admin_id);

            let applied = apply_adjustment(conn, &request).await?;
            restored.push(applied.log);
        }
    }

    let mut active: OrderActiveModel = order.into();
    active.status = Set(update.status);
    if let Some(tracking) = &update.tracking_number {
        active.tracking_number = Set(Some(tracking.clone()));
    }
    if let Some(notes) = &update.notes {
        active.notes = Set(Some(notes.clone()));
    }
    active.updated_at = Set(Utc::now());
    let order = active.update(conn).await?;

    Ok(StatusChangeOutcome {
        order,
        previous_status,
        restored,
    })
}

#[derive(Clone)]
pub struct OrderStatusService {
    db: Arc<DbPool>,
}

impl OrderStatusService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Sets an order's status. Cancelling returns every line item's quantity to
    /// stock in the same transaction; cancelling an already cancelled order
    /// restores nothing.
    #[instrument(skip(self, update), fields(order_id = %update.order_id, new_status = %update.status))]
    pub async fn set_order_status(
        &self,
        update: StatusUpdate,
    ) -> Result<StatusChangeOutcome, ServiceError> {
        let order_id = update.order_id;

        let outcome = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move { reconcile_status(txn, &update).await })
        })
        .await
        .map_err(|e| {
            if e.is_internal() {
                error!(order_id = %order_id, error = %e, "Failed to update order status");
            }
            e
        })?;

        metrics::ORDER_STATUS_CHANGES
            .with_label_values(&[&outcome.order.status.to_string()])
            .inc();
        if !outcome.restored.is_empty() {
            let units: i64 = outcome.restored.iter().map(|log| i64::from(log.change)).sum();
            metrics::STOCK_RESTORED_UNITS.inc_by(units.max(0) as u64);
            for _ in &outcome.restored {
                metrics::record_adjustment_applied(InventoryLogType::OrderCancelled);
            }
        }

        info!(
            order_id = %order_id,
            from = %outcome.previous_status,
            to = %outcome.order.status,
            restored_items = outcome.restored.len(),
            "Order status updated"
        );

        Ok(outcome)
    }
}
