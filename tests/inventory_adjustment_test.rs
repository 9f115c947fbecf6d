mod common;

use assert_matches::assert_matches;
use sea_orm::EntityTrait;
use storefront_api::{
    entities::{inventory_log, InventoryLog, InventoryLogType, ProductVariant},
    errors::ServiceError,
    queries::{
        inventory_queries::{AuditVariantLedgerQuery, GetVariantLedgerQuery},
        Query,
    },
    services::inventory_adjustment_service::{
        AdjustmentRequest, BulkAdjustmentItem, InventoryAdjustmentService, SkipReason,
    },
};
use uuid::Uuid;

#[tokio::test]
async fn adjustments_update_stock_and_record_resulting_level() {
    let db = common::test_db().await;
    let (_, variant) = common::seed_variant(&db, "TEE-M", 5).await;
    let service = InventoryAdjustmentService::new(db.clone());
    let admin = Uuid::new_v4();

    let sold = service
        .adjust(
            AdjustmentRequest::new(variant.id, -3, InventoryLogType::ManualAdjustment)
                .with_note("shelf count")
                .with_admin(Some(admin)),
        )
        .await
        .expect("decrement within stock");
    assert_eq!(sold.variant.stock, 2);
    assert_eq!(sold.log.change, -3);
    assert_eq!(sold.log.resulting_stock, 2);
    assert_eq!(sold.log.admin_id, Some(admin));
    assert_eq!(sold.log.note.as_deref(), Some("shelf count"));

    let rejected = service
        .adjust(AdjustmentRequest::new(
            variant.id,
            -5,
            InventoryLogType::DamagedLost,
        ))
        .await;
    assert_matches!(rejected, Err(ServiceError::InsufficientStock(_)));

    let restocked = service
        .adjust(AdjustmentRequest::new(variant.id, 10, InventoryLogType::Restock))
        .await
        .expect("restock");
    assert_eq!(restocked.variant.stock, 12);
    assert_eq!(restocked.log.resulting_stock, 12);

    // Initial stock entry, the decrement and the restock. The rejection left no trace.
    let ledger = GetVariantLedgerQuery::new(variant.id, None, None)
        .execute(&db)
        .await
        .expect("ledger");
    assert_eq!(ledger.total, 3);
    assert_eq!(ledger.entries[0].log_type, InventoryLogType::Restock);
    assert_eq!(ledger.entries[0].change, 10);
    assert_eq!(ledger.entries[2].log_type, InventoryLogType::Restock);
    assert_eq!(ledger.entries[2].change, 5);
}

#[tokio::test]
async fn rejected_adjustment_leaves_stock_untouched() {
    let db = common::test_db().await;
    let (_, variant) = common::seed_variant(&db, "MUG-350", 2).await;
    let service = InventoryAdjustmentService::new(db.clone());

    let err = service
        .adjust(AdjustmentRequest::new(
            variant.id,
            -3,
            InventoryLogType::ManualAdjustment,
        ))
        .await
        .expect_err("cannot go negative");
    assert_matches!(err, ServiceError::InsufficientStock(ref msg) if msg.contains("MUG-350"));

    let stored = ProductVariant::find_by_id(variant.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock, 2);
}

#[tokio::test]
async fn unknown_variant_and_zero_change_are_rejected() {
    let db = common::test_db().await;
    let (_, variant) = common::seed_variant(&db, "CAP-OS", 4).await;
    let service = InventoryAdjustmentService::new(db.clone());

    let missing = service
        .adjust(AdjustmentRequest::new(
            Uuid::new_v4(),
            1,
            InventoryLogType::Restock,
        ))
        .await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));

    let zero = service
        .adjust(AdjustmentRequest::new(
            variant.id,
            0,
            InventoryLogType::ManualAdjustment,
        ))
        .await;
    assert_matches!(zero, Err(ServiceError::ValidationError(_)));

    let long_note = service
        .adjust(
            AdjustmentRequest::new(variant.id, 1, InventoryLogType::ManualAdjustment)
                .with_note("x".repeat(501)),
        )
        .await;
    assert_matches!(long_note, Err(ServiceError::ValidationError(_)));

    let logs = InventoryLog::find().all(db.as_ref()).await.unwrap();
    assert_eq!(logs.len(), 1, "only the initial stock entry exists");
}

#[tokio::test]
async fn ledger_replays_to_current_stock() {
    let db = common::test_db().await;
    let (_, variant) = common::seed_variant(&db, "SOCK-L", 7).await;
    let service = InventoryAdjustmentService::new(db.clone());

    for change in [-2, 4, -10, -1, 3] {
        let _ = service
            .adjust(AdjustmentRequest::new(
                variant.id,
                change,
                InventoryLogType::ManualAdjustment,
            ))
            .await;
    }

    let audit = AuditVariantLedgerQuery {
        variant_id: variant.id,
    }
    .execute(&db)
    .await
    .expect("audit");
    // 7 - 2 + 4 - 1 + 3; the -10 was rejected.
    assert_eq!(audit.stock, 11);
    assert_eq!(audit.ledger_sum, 11);
    assert_eq!(audit.entries, 5);
    assert_eq!(audit.latest_resulting_stock, Some(11));
    assert!(audit.consistent);
}

#[tokio::test]
async fn bulk_adjust_applies_valid_items_and_reports_skips() {
    let db = common::test_db().await;
    let (_, plenty) = common::seed_variant(&db, "BULK-A", 10).await;
    let (_, scarce) = common::seed_variant(&db, "BULK-B", 1).await;
    let ghost = Uuid::new_v4();
    let admin = Uuid::new_v4();

    let result = InventoryAdjustmentService::new(db.clone())
        .bulk_adjust(
            vec![
                BulkAdjustmentItem {
                    variant_id: plenty.id,
                    change: -4,
                    note: Some("cycle count".to_string()),
                },
                BulkAdjustmentItem {
                    variant_id: ghost,
                    change: 2,
                    note: None,
                },
                BulkAdjustmentItem {
                    variant_id: scarce.id,
                    change: -2,
                    note: None,
                },
            ],
            InventoryLogType::ManualAdjustment,
            Some(admin),
        )
        .await
        .expect("bulk adjust");

    assert_eq!(result.updated, 1);
    assert_eq!(result.applied[0].variant.stock, 6);
    assert_eq!(result.applied[0].log.admin_id, Some(admin));
    assert_eq!(result.skipped.len(), 2);
    assert_eq!(result.skipped[0].index, 1);
    assert_eq!(result.skipped[0].reason, SkipReason::VariantNotFound);
    assert_eq!(result.skipped[1].index, 2);
    assert_eq!(result.skipped[1].reason, SkipReason::InsufficientStock);

    let scarce_now = ProductVariant::find_by_id(scarce.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(scarce_now.stock, 1);
}

#[tokio::test]
async fn bulk_adjust_rejects_malformed_batches_without_writing() {
    let db = common::test_db().await;
    let (_, variant) = common::seed_variant(&db, "BULK-C", 3).await;
    let service = InventoryAdjustmentService::new(db.clone());

    let empty = service
        .bulk_adjust(Vec::new(), InventoryLogType::Restock, None)
        .await;
    assert_matches!(empty, Err(ServiceError::ValidationError(_)));

    let with_zero = service
        .bulk_adjust(
            vec![
                BulkAdjustmentItem {
                    variant_id: variant.id,
                    change: 5,
                    note: None,
                },
                BulkAdjustmentItem {
                    variant_id: variant.id,
                    change: 0,
                    note: None,
                },
            ],
            InventoryLogType::Restock,
            None,
        )
        .await;
    assert_matches!(with_zero, Err(ServiceError::ValidationError(ref msg)) if msg.starts_with("Item 1"));

    let stored = ProductVariant::find_by_id(variant.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock, 3);
}

#[tokio::test]
async fn ledger_pages_are_newest_first() {
    let db = common::test_db().await;
    let (_, variant) = common::seed_variant(&db, "PAGE-1", 1).await;
    let service = InventoryAdjustmentService::new(db.clone());
    for _ in 0..4 {
        service
            .adjust(AdjustmentRequest::new(variant.id, 1, InventoryLogType::Restock))
            .await
            .unwrap();
    }

    let first = GetVariantLedgerQuery::new(variant.id, Some(1), Some(2))
        .execute(&db)
        .await
        .unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(first.total_pages, 3);
    let stocks: Vec<i32> = first.entries.iter().map(|l| l.resulting_stock).collect();
    assert_eq!(stocks, vec![5, 4]);

    let last = GetVariantLedgerQuery::new(variant.id, Some(3), Some(2))
        .execute(&db)
        .await
        .unwrap();
    assert_eq!(last.entries.len(), 1);
    assert_eq!(last.entries[0].resulting_stock, 1);

    let missing = GetVariantLedgerQuery::new(Uuid::new_v4(), None, None)
        .execute(&db)
        .await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn ledger_entries_are_append_only() {
    let db = common::test_db().await;
    let (_, variant) = common::seed_variant(&db, "APPEND-1", 2).await;
    let before = InventoryLog::find().all(db.as_ref()).await.unwrap();

    InventoryAdjustmentService::new(db.clone())
        .adjust(AdjustmentRequest::new(variant.id, 3, InventoryLogType::Restock))
        .await
        .unwrap();

    let after = InventoryLog::find().all(db.as_ref()).await.unwrap();
    assert_eq!(after.len(), before.len() + 1);
    for original in &before {
        let same: &inventory_log::Model = after
            .iter()
            .find(|log| log.id == original.id)
            .expect("existing entry still present");
        assert_eq!(same, original);
    }
}
