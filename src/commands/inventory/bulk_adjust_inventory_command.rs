use crate::{
    commands::{
        failure_label,
        inventory::adjust_inventory_command::default_log_type,
        Command,
    },
    db::DbPool,
    entities::InventoryLogType,
    errors::ServiceError,
    services::inventory_adjustment_service::{
        BulkAdjustmentItem, BulkAdjustmentResult, InventoryAdjustmentService,
    },
};
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref BULK_COMMAND_FAILURES: IntCounterVec = register_int_counter_vec!(
        "inventory_bulk_adjust_command_failures_total",
        "Failed bulk adjustment commands",
        &["error_type"]
    )
    .expect("metric can be registered");
}

/// `POST /api/v1/inventory/bulk-adjust`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkAdjustInventoryCommand {
    #[validate(length(min = 1, max = 500, message = "Between 1 and 500 adjustments are required"))]
    pub adjustments: Vec<BulkAdjustmentItem>,
    #[serde(default = "default_log_type", rename = "type")]
    pub log_type: InventoryLogType,
    #[serde(skip)]
    pub admin_id: Option<Uuid>,
}

impl BulkAdjustInventoryCommand {
    pub fn acting_as(mut self, admin_id: Uuid) -> Self {
        self.admin_id = Some(admin_id);
        self
    }
}

#[async_trait::async_trait]
impl Command for BulkAdjustInventoryCommand {
    type Result = BulkAdjustmentResult;

    #[instrument(skip(self, db_pool), fields(items = self.adjustments.len()))]
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError> {
        let outcome = async {
            self.validate()?;
            InventoryAdjustmentService::new(db_pool)
                .bulk_adjust(self.adjustments.clone(), self.log_type, self.admin_id)
                .await
        }
        .await;

        if let Err(e) = &outcome {
            let label = failure_label(e);
            BULK_COMMAND_FAILURES.with_label_values(&[label]).inc();
            warn!(error = %e, error_type = label, "Bulk adjust command failed");
        }
        outcome
    }
}
