use crate::{
    commands::{failure_label, Command},
    db::DbPool,
    entities::OrderStatus,
    errors::ServiceError,
    services::order_status::{OrderStatusService, StatusChangeOutcome, StatusUpdate},
};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref ORDER_STATUS_UPDATE_FAILURES: IntCounter = register_int_counter!(
        "order_status_update_failures_total",
        "Total number of failed order status updates"
    )
    .expect("metric can be registered");
}

/// `PUT /api/v1/orders/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusCommand {
    #[serde(skip)]
    pub order_id: Uuid,
    pub status: OrderStatus,
    #[validate(length(min = 1, max = 100, message = "Tracking number must be 1-100 characters"))]
    pub tracking_number: Option<String>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
    #[serde(skip)]
    pub admin_id: Option<Uuid>,
}

impl UpdateOrderStatusCommand {
    pub fn for_order(mut self, order_id: Uuid, admin_id: Uuid) -> Self {
        self.order_id = order_id;
        self.admin_id = Some(admin_id);
        self
    }
}

#[async_trait::async_trait]
impl Command for UpdateOrderStatusCommand {
    type Result = StatusChangeOutcome;

    #[instrument(skip(self, db_pool), fields(order_id = %self.order_id, status = %self.status))]
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError> {
        let outcome = async {
            self.validate()?;
            OrderStatusService::new(db_pool)
                .set_order_status(StatusUpdate {
                    order_id: self.order_id,
                    status: self.status,
                    tracking_number: self.tracking_number.clone(),
                    notes: self.notes.clone(),
                    admin_id: self.admin_id,
                })
                .await
        }
        .await;

        if let Err(e) = &outcome {
            ORDER_STATUS_UPDATE_FAILURES.inc();
            error!(
                order_id = %self.order_id,
                error_type = failure_label(e),
                "Failed to update order status: {}",
                e
            );
        }
        outcome
    }
}
