mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use storefront_api::{
    entities::{inventory_log, InventoryLog, InventoryLogType, Order, OrderStatus, ProductVariant},
    errors::ServiceError,
    queries::{
        inventory_queries::{AuditVariantLedgerQuery, GetTurnoverQuery},
        Query,
    },
    services::{
        order_status::{OrderStatusService, StatusUpdate, DEFAULT_CANCELLATION_NOTE},
        orders::{OrderLineRequest, OrderService, PlaceOrder},
    },
};
use uuid::Uuid;

fn order_for(lines: &[(Uuid, i32)]) -> PlaceOrder {
    PlaceOrder {
        customer_email: Some("shopper@example.com".to_string()),
        items: lines
            .iter()
            .map(|(variant_id, quantity)| OrderLineRequest {
                variant_id: *variant_id,
                quantity: *quantity,
            })
            .collect(),
        notes: None,
    }
}

fn status(order_id: Uuid, status: OrderStatus) -> StatusUpdate {
    StatusUpdate {
        order_id,
        status,
        tracking_number: None,
        notes: None,
        admin_id: None,
    }
}

async fn stock_of(db: &storefront_api::db::DbPool, variant_id: Uuid) -> i32 {
    ProductVariant::find_by_id(variant_id)
        .one(db)
        .await
        .unwrap()
        .expect("variant exists")
        .stock
}

#[tokio::test]
async fn placing_an_order_reserves_stock_and_prices_lines() {
    let db = common::test_db().await;
    let (_, tee) = common::seed_variant(&db, "TEE-S", 5).await;
    let (_, mug) = common::seed_variant(&db, "MUG-1", 3).await;

    let placed = OrderService::new(db.clone())
        .place_order(order_for(&[(tee.id, 2), (mug.id, 3)]))
        .await
        .expect("order placed");

    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert!(placed.order.order_number.starts_with("ORD-"));
    assert_eq!(placed.items.len(), 2);
    // Seeded variants are priced at 19.99.
    assert_eq!(placed.order.total_amount, dec!(99.95));
    assert_eq!(placed.reservations.len(), 2);
    assert!(placed
        .reservations
        .iter()
        .all(|log| log.log_type == InventoryLogType::OrderPlaced
            && log.order_id == Some(placed.order.id)));
    assert_eq!(placed.reservations[1].resulting_stock, 0);

    assert_eq!(stock_of(&db, tee.id).await, 3);
    assert_eq!(stock_of(&db, mug.id).await, 0);
}

#[tokio::test]
async fn short_line_rolls_back_the_whole_order() {
    let db = common::test_db().await;
    let (_, tee) = common::seed_variant(&db, "TEE-XL", 5).await;
    let (_, mug) = common::seed_variant(&db, "MUG-2", 1).await;

    let result = OrderService::new(db.clone())
        .place_order(order_for(&[(tee.id, 2), (mug.id, 2)]))
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    assert_eq!(stock_of(&db, tee.id).await, 5);
    assert_eq!(stock_of(&db, mug.id).await, 1);
    assert!(Order::find().all(db.as_ref()).await.unwrap().is_empty());
    let order_logs = InventoryLog::find()
        .filter(inventory_log::Column::LogType.eq(InventoryLogType::OrderPlaced))
        .all(db.as_ref())
        .await
        .unwrap();
    assert!(order_logs.is_empty());

    let missing = OrderService::new(db.clone())
        .place_order(order_for(&[(Uuid::new_v4(), 1)]))
        .await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn cancelling_restores_exactly_once() {
    let db = common::test_db().await;
    let (_, tee) = common::seed_variant(&db, "TEE-L", 6).await;
    let (_, mug) = common::seed_variant(&db, "MUG-3", 4).await;
    let placed = OrderService::new(db.clone())
        .place_order(order_for(&[(tee.id, 2), (mug.id, 1)]))
        .await
        .unwrap();
    let statuses = OrderStatusService::new(db.clone());
    let admin = Uuid::new_v4();

    let first = statuses
        .set_order_status(StatusUpdate {
            admin_id: Some(admin),
            ..status(placed.order.id, OrderStatus::Cancelled)
        })
        .await
        .expect("cancel");
    assert_eq!(first.previous_status, OrderStatus::Pending);
    assert_eq!(first.order.status, OrderStatus::Cancelled);
    assert_eq!(first.restored.len(), 2);
    for log in &first.restored {
        assert_eq!(log.log_type, InventoryLogType::OrderCancelled);
        assert_eq!(log.order_id, Some(placed.order.id));
        assert_eq!(log.admin_id, Some(admin));
        assert_eq!(log.note.as_deref(), Some(DEFAULT_CANCELLATION_NOTE));
    }
    assert_eq!(stock_of(&db, tee.id).await, 6);
    assert_eq!(stock_of(&db, mug.id).await, 4);

    let second = statuses
        .set_order_status(status(placed.order.id, OrderStatus::Cancelled))
        .await
        .expect("cancel again");
    assert!(second.restored.is_empty());
    assert_eq!(stock_of(&db, tee.id).await, 6);

    for variant_id in [tee.id, mug.id] {
        let audit = AuditVariantLedgerQuery { variant_id }
            .execute(&db)
            .await
            .unwrap();
        assert!(audit.consistent);
    }
}

#[tokio::test]
async fn status_update_keeps_tracking_and_notes() {
    let db = common::test_db().await;
    let (_, tee) = common::seed_variant(&db, "TEE-XS", 3).await;
    let placed = OrderService::new(db.clone())
        .place_order(order_for(&[(tee.id, 1)]))
        .await
        .unwrap();
    let statuses = OrderStatusService::new(db.clone());

    let shipped = statuses
        .set_order_status(StatusUpdate {
            tracking_number: Some("1Z999AA10123456784".to_string()),
            notes: Some("Left with concierge".to_string()),
            ..status(placed.order.id, OrderStatus::Shipped)
        })
        .await
        .unwrap();
    assert!(shipped.restored.is_empty());
    assert_eq!(
        shipped.order.tracking_number.as_deref(),
        Some("1Z999AA10123456784")
    );

    // Fields left out of a later update are kept.
    let delivered = statuses
        .set_order_status(status(placed.order.id, OrderStatus::Delivered))
        .await
        .unwrap();
    assert_eq!(delivered.previous_status, OrderStatus::Shipped);
    assert_eq!(
        delivered.order.tracking_number.as_deref(),
        Some("1Z999AA10123456784")
    );
    assert_eq!(delivered.order.notes.as_deref(), Some("Left with concierge"));
    let stored = Order::find_by_id(placed.order.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Delivered);
    assert_eq!(stock_of(&db, tee.id).await, 2);
}

#[tokio::test]
async fn cancellation_note_is_used_for_restorations() {
    let db = common::test_db().await;
    let (_, tee) = common::seed_variant(&db, "TEE-NOTE", 2).await;
    let placed = OrderService::new(db.clone())
        .place_order(order_for(&[(tee.id, 2)]))
        .await
        .unwrap();

    let outcome = OrderStatusService::new(db.clone())
        .set_order_status(StatusUpdate {
            notes: Some("Customer changed mind".to_string()),
            ..status(placed.order.id, OrderStatus::Cancelled)
        })
        .await
        .unwrap();
    assert_eq!(
        outcome.restored[0].note.as_deref(),
        Some("Customer changed mind")
    );
    assert_eq!(outcome.restored[0].resulting_stock, 2);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let db = common::test_db().await;
    let statuses = OrderStatusService::new(db.clone());

    let result = statuses
        .set_order_status(status(Uuid::new_v4(), OrderStatus::Cancelled))
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
    assert_matches!(
        OrderService::new(db.clone()).get_order(Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn turnover_counts_shipped_and_delivered_units() {
    let db = common::test_db().await;
    let (_, fast) = common::seed_variant(&db, "FAST-1", 10).await;
    let (_, slow) = common::seed_variant(&db, "SLOW-1", 10).await;
    let orders = OrderService::new(db.clone());
    let statuses = OrderStatusService::new(db.clone());

    let shipped = orders.place_order(order_for(&[(fast.id, 4)])).await.unwrap();
    statuses
        .set_order_status(status(shipped.order.id, OrderStatus::Shipped))
        .await
        .unwrap();
    let delivered = orders
        .place_order(order_for(&[(fast.id, 2), (slow.id, 1)]))
        .await
        .unwrap();
    statuses
        .set_order_status(status(delivered.order.id, OrderStatus::Delivered))
        .await
        .unwrap();
    // Pending orders are not sales yet.
    orders.place_order(order_for(&[(slow.id, 5)])).await.unwrap();

    let report = GetTurnoverQuery.execute(&db).await.unwrap();
    let fast_row = report.iter().find(|r| r.variant_id == fast.id).unwrap();
    let slow_row = report.iter().find(|r| r.variant_id == slow.id).unwrap();

    assert_eq!(fast_row.sold, 6);
    assert_eq!(fast_row.stock, 4);
    assert!((fast_row.turnover_rate - 0.6).abs() < 1e-9);
    assert_eq!(slow_row.sold, 1);
    assert_eq!(slow_row.stock, 4);
    assert!((slow_row.turnover_rate - 0.2).abs() < 1e-9);
}

#[tokio::test]
async fn prices_are_stored_at_four_decimal_places() {
    use storefront_api::services::product_catalog_service::{NewVariant, ProductCatalogService};

    let db = common::test_db().await;
    let product = common::seed_product(&db, "Espresso Beans").await;
    let created = ProductCatalogService::new(db.clone())
        .create_variant(
            product.id,
            NewVariant {
                sku: "BEANS-1KG".to_string(),
                name: "1 kg".to_string(),
                price: dec!(1234.5678),
                compare_at_price: Some(dec!(150.5)),
                initial_stock: 4,
            },
        )
        .await
        .unwrap();

    let stored = ProductVariant::find_by_id(created.variant.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.price, dec!(1234.5678));
    assert_eq!(stored.compare_at_price, Some(dec!(150.5)));

    let placed = OrderService::new(db.clone())
        .place_order(order_for(&[(stored.id, 3)]))
        .await
        .unwrap();
    assert_eq!(placed.order.total_amount, dec!(3703.7034));
}
