//! Prometheus counters for the inventory ledger, exposed at `/metrics`.

use axum::{http::header, http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};
use tracing::{error, trace};

use crate::entities::InventoryLogType;

lazy_static! {
    pub static ref ADJUSTMENTS_APPLIED: IntCounterVec = register_int_counter_vec!(
        "inventory_adjustments_applied_total",
        "Stock adjustments applied, by log type",
        &["log_type"]
    )
    .expect("metric can be registered");

    pub static ref ADJUSTMENTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "inventory_adjustments_rejected_total",
        "Stock adjustments rejected, by reason",
        &["reason"]
    )
    .expect("metric can be registered");

    pub static ref BULK_ITEMS_SKIPPED: IntCounterVec = register_int_counter_vec!(
        "inventory_bulk_items_skipped_total",
        "Bulk adjustment items skipped, by reason",
        &["reason"]
    )
    .expect("metric can be registered");

    pub static ref STOCK_RESTORED_UNITS: IntCounter = register_int_counter!(
        "inventory_stock_restored_units_total",
        "Units returned to stock by order cancellation"
    )
    .expect("metric can be registered");

    pub static ref ORDERS_PLACED: IntCounter = register_int_counter!(
        "orders_placed_total",
        "Orders placed with stock reserved"
    )
    .expect("metric can be registered");

    pub static ref ORDER_STATUS_CHANGES: IntCounterVec = register_int_counter_vec!(
        "order_status_changes_total",
        "Order status updates, by new status",
        &["status"]
    )
    .expect("metric can be registered");
}

pub fn record_adjustment_applied(log_type: InventoryLogType) {
    ADJUSTMENTS_APPLIED
        .with_label_values(&[&log_type.to_string()])
        .inc();
}

pub fn record_adjustment_rejected(reason: &str) {
    ADJUSTMENTS_REJECTED.with_label_values(&[reason]).inc();
}

pub fn record_bulk_skip(reason: &str) {
    BULK_ITEMS_SKIPPED.with_label_values(&[reason]).inc();
}

/// Gather all metrics and return them in the Prometheus text format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// `GET /metrics`
pub async fn metrics_handler() -> impl IntoResponse {
    trace!("Serving metrics scrape");
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_scrape() {
        record_adjustment_applied(InventoryLogType::Restock);
        record_adjustment_rejected("insufficient_stock");
        ORDERS_PLACED.inc();

        let text = gather_metrics().expect("metrics encode");
        assert!(text.contains("inventory_adjustments_applied_total"));
        assert!(text.contains("log_type=\"RESTOCK\""));
        assert!(text.contains("orders_placed_total"));
    }
}
