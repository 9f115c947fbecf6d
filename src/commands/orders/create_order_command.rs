use crate::{
    commands::{failure_label, Command},
    db::DbPool,
    errors::ServiceError,
    services::orders::{OrderLineRequest, OrderService, PlaceOrder, PlacedOrder},
};
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

lazy_static! {
    static ref ORDER_CREATION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "order_creation_failures_total",
        "Failed order placements",
        &["error_type"]
    )
    .expect("metric can be registered");
}

/// `POST /api/v1/orders`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderCommand {
    #[validate(email(message = "Customer email is not valid"))]
    pub customer_email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 items are required"))]
    pub items: Vec<OrderLineRequest>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[async_trait::async_trait]
impl Command for CreateOrderCommand {
    type Result = PlacedOrder;

    #[instrument(skip(self, db_pool), fields(items = self.items.len()))]
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError> {
        let outcome = async {
            self.validate()?;
            OrderService::new(db_pool)
                .place_order(PlaceOrder {
                    customer_email: self.customer_email.clone(),
                    items: self.items.clone(),
                    notes: self.notes.clone(),
                })
                .await
        }
        .await;

        if let Err(e) = &outcome {
            let label = failure_label(e);
            ORDER_CREATION_FAILURES.with_label_values(&[label]).inc();
            warn!(error = %e, error_type = label, "Create order command failed");
        }
        outcome
    }
}
