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
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Largest number of lines accepted on one order.
pub const MAX_ORDER_LINES: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub variant_id: Uuid,
    pub quantity: i32,
}

/// Input for placing an order; stock is reserved for every line or for none.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_email: Option<String>,
    pub items: Vec<OrderLineRequest>,
    pub notes: Option<String>,
}

/// An order with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetails {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Result of placing an order, including the ledger entries that reserved stock.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlacedOrder {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
    pub reservations: Vec<inventory_log::Model>,
}

/// Generates a human-facing order number such as `ORD-20240301-K3Z9QA`.
pub fn generate_order_number() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

fn check_lines(items: &[OrderLineRequest]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "An order needs at least one item".to_string(),
        ));
    }
    if items.len() > MAX_ORDER_LINES {
        return Err(ServiceError::ValidationError(format!(
            "An order accepts at most {} items",
            MAX_ORDER_LINES
        )));
    }
    if let Some((index, line)) = items.iter().enumerate().find(|(_, l)| l.quantity <= 0) {
        return Err(ServiceError::ValidationError(format!(
            "Item {}: quantity must be positive, got {}",
            index, line.quantity
        )));
    }
    Ok(())
}

async fn insert_order<C>(conn: &C, request: &PlaceOrder) -> Result<PlacedOrder, ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let order = OrderActiveModel {
        id: Set(Uuid::new_v4()),
        order_number: Set(generate_order_number()),
        customer_email: Set(request.customer_email.clone()),
        status: Set(OrderStatus::Pending),
        total_amount: Set(Decimal::ZERO),
        tracking_number: Set(None),
        notes: Set(request.notes.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    let mut items = Vec::with_capacity(request.items.len());
    let mut reservations = Vec::with_capacity(request.items.len());
    let mut total = Decimal::ZERO;

    for line in &request.items {
        let reserve = AdjustmentRequest::new(
            line.variant_id,
            -line.quantity,
            InventoryLogType::OrderPlaced,
        )
        .with_order(order.id)
        .with_note(format!("Order {}", order.order_number));
        let applied = apply_adjustment(conn, &reserve).await?;

        let item = order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            variant_id: Set(line.variant_id),
            quantity: Set(line.quantity),
            unit_price: Set(applied.variant.price),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;

        total += item.line_total();
        items.push(item);
        reservations.push(applied.log);
    }

    let mut active: OrderActiveModel = order.into();
    active.total_amount = Set(total);
    let order = active.update(conn).await?;

    Ok(PlacedOrder {
        order,
        items,
        reservations,
    })
}

#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates a PENDING order and decrements stock for each line. A missing
    /// variant or insufficient stock on any line rolls back the whole order.
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<PlacedOrder, ServiceError> {
        check_lines(&request.items)?;

        let placed = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move { insert_order(txn, &request).await })
        })
        .await?;

        metrics::ORDERS_PLACED.inc();
        for _ in &placed.reservations {
            metrics::record_adjustment_applied(InventoryLogType::OrderPlaced);
        }
        info!(
            order_id = %placed.order.id,
            order_number = %placed.order.order_number,
            total = %placed.order.total_amount,
            "Order placed"
        );
        Ok(placed)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetails, ServiceError> {
        let db = self.db_pool.as_ref();
        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(OrderDetails { order, items })
    }
}
