use crate::{
    commands::{failure_label, Command},
    db::DbPool,
    entities::InventoryLogType,
    errors::ServiceError,
    services::inventory_adjustment_service::{
        AdjustmentRequest, AppliedAdjustment, InventoryAdjustmentService,
    },
};
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref ADJUST_COMMAND_FAILURES: IntCounterVec = register_int_counter_vec!(
        "inventory_adjust_command_failures_total",
        "Failed single-variant adjustment commands",
        &["error_type"]
    )
    .expect("metric can be registered");
}

/// Rejects a zero delta; a ledger entry must move stock.
pub(crate) fn validate_nonzero(change: i32) -> Result<(), ValidationError> {
    if change == 0 {
        let mut err = ValidationError::new("nonzero");
        err.message = Some("Change must be nonzero".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn default_log_type() -> InventoryLogType {
    InventoryLogType::ManualAdjustment
}

/// `POST /api/v1/inventory/adjust`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdjustInventoryCommand {
    pub variant_id: Uuid,
    /// Signed delta; positive adds stock.
    #[validate(custom = "validate_nonzero")]
    pub change: i32,
    #[serde(default = "default_log_type", rename = "type")]
    pub log_type: InventoryLogType,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
    pub order_id: Option<Uuid>,
    /// Filled from the admin session, never from the body.
    #[serde(skip)]
    pub admin_id: Option<Uuid>,
}

impl AdjustInventoryCommand {
    pub fn acting_as(mut self, admin_id: Uuid) -> Self {
        self.admin_id = Some(admin_id);
        self
    }
}

#[async_trait::async_trait]
impl Command for AdjustInventoryCommand {
    type Result = AppliedAdjustment;

    #[instrument(skip(self, db_pool), fields(variant_id = %self.variant_id, change = self.change))]
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError> {
        let outcome = async {
            self.validate()?;

            let request = AdjustmentRequest {
                variant_id: self.variant_id,
                change: self.change,
                log_type: self.log_type,
                note: self.note.clone(),
                order_id: self.order_id,
                admin_id: self.admin_id,
            };
            InventoryAdjustmentService::new(db_pool).adjust(request).await
        }
        .await;

        if let Err(e) = &outcome {
            let label = failure_label(e);
            ADJUST_COMMAND_FAILURES.with_label_values(&[label]).inc();
            warn!(error = %e, error_type = label, "Adjust inventory command failed");
        }
        outcome
    }
}
