use crate::{
    auth::AdminSession,
    commands::{
        inventory::{AdjustInventoryCommand, BulkAdjustInventoryCommand},
        Command,
    },
    errors::{ErrorResponse, ServiceError},
    handlers::common::{json_body, path_id, query_params, success_response, PaginationParams},
    queries::{
        inventory_queries::{
            AuditVariantLedgerQuery, GetLowStockQuery, GetOutOfStockQuery,
            GetStockOutFrequencyQuery, GetTurnoverQuery, GetVariantLedgerQuery, LedgerAudit,
            LedgerPage, StockLevel, StockOutFrequency, VariantTurnover,
        },
        Query as _,
    },
    services::inventory_adjustment_service::{AppliedAdjustment, BulkAdjustmentResult},
    ApiResponse, AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Json, Path, Query, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockParams {
    /// Upper bound on stock; defaults to the configured threshold
    pub threshold: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockOutParams {
    pub limit: Option<u64>,
}

/// Inventory routes, nested under `/api/v1/inventory`. Every route needs an admin session.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/adjust", post(adjust_inventory))
        .route("/bulk-adjust", post(bulk_adjust_inventory))
        .route("/low-stock", get(low_stock))
        .route("/out-of-stock", get(out_of_stock))
        .route("/stock-outs", get(stock_out_frequency))
        .route("/turnover", get(turnover))
        .route("/variants/:id/logs", get(variant_logs))
        .route("/variants/:id/audit", get(variant_audit))
}

/// Apply a signed stock change to one variant
#[utoipa::path(
    post,
    path = "/api/v1/inventory/adjust",
    request_body = AdjustInventoryCommand,
    responses(
        (status = 200, description = "Adjustment applied", body = ApiResponse<AppliedAdjustment>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Variant not found", body = ErrorResponse),
        (status = 422, description = "Insufficient stock", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    session: AdminSession,
    payload: Result<Json<AdjustInventoryCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let command = json_body(payload)?.acting_as(session.admin_id);
    let applied = command.execute(state.db.clone()).await?;
    Ok(success_response(applied))
}

/// Apply many changes; items that cannot be applied are reported, not fatal
#[utoipa::path(
    post,
    path = "/api/v1/inventory/bulk-adjust",
    request_body = BulkAdjustInventoryCommand,
    responses(
        (status = 200, description = "Batch processed", body = ApiResponse<BulkAdjustmentResult>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn bulk_adjust_inventory(
    State(state): State<AppState>,
    session: AdminSession,
    payload: Result<Json<BulkAdjustInventoryCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let command = json_body(payload)?.acting_as(session.admin_id);
    let result = command.execute(state.db.clone()).await?;
    info!(
        admin_id = %session.admin_id,
        updated = result.updated,
        skipped = result.skipped.len(),
        "Bulk adjustment via API"
    );
    Ok(success_response(result))
}

/// Variants with stock above zero and at or below the threshold
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    params(LowStockParams),
    responses(
        (status = 200, description = "Low stock variants", body = ApiResponse<Vec<StockLevel>>),
        (status = 400, description = "Invalid threshold", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    _session: AdminSession,
    params: Result<Query<LowStockParams>, QueryRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let params = query_params(params)?;
    let query = GetLowStockQuery {
        threshold: params.threshold.unwrap_or(state.config.low_stock_threshold),
    };
    Ok(success_response(query.execute(&state.db).await?))
}

/// Variants with no stock
#[utoipa::path(
    get,
    path = "/api/v1/inventory/out-of-stock",
    responses(
        (status = 200, description = "Out of stock variants", body = ApiResponse<Vec<StockLevel>>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn out_of_stock(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(GetOutOfStockQuery.execute(&state.db).await?))
}

/// Products most often sold out by an order
#[utoipa::path(
    get,
    path = "/api/v1/inventory/stock-outs",
    params(StockOutParams),
    responses(
        (status = 200, description = "Stock-out counts per product", body = ApiResponse<Vec<StockOutFrequency>>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn stock_out_frequency(
    State(state): State<AppState>,
    _session: AdminSession,
    params: Result<Query<StockOutParams>, QueryRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let params = query_params(params)?;
    let query = GetStockOutFrequencyQuery {
        limit: params.limit,
    };
    Ok(success_response(query.execute(&state.db).await?))
}

/// Turnover per variant, slow movers first
#[utoipa::path(
    get,
    path = "/api/v1/inventory/turnover",
    responses(
        (status = 200, description = "Turnover per variant", body = ApiResponse<Vec<VariantTurnover>>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn turnover(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(GetTurnoverQuery.execute(&state.db).await?))
}

/// A variant's ledger entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory/variants/{id}/logs",
    params(("id" = Uuid, Path, description = "Variant id"), PaginationParams),
    responses(
        (status = 200, description = "Ledger page", body = ApiResponse<LedgerPage>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Variant not found", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn variant_logs(
    State(state): State<AppState>,
    _session: AdminSession,
    path: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let variant_id = path_id(path)?;
    let params = query_params(params)?;
    let query = GetVariantLedgerQuery::new(variant_id, params.page, params.per_page);
    Ok(success_response(query.execute(&state.db).await?))
}

/// Replays a variant's ledger against its stored stock
#[utoipa::path(
    get,
    path = "/api/v1/inventory/variants/{id}/audit",
    params(("id" = Uuid, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Ledger audit", body = ApiResponse<LedgerAudit>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Variant not found", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn variant_audit(
    State(state): State<AppState>,
    _session: AdminSession,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let variant_id = path_id(path)?;
    let query = AuditVariantLedgerQuery { variant_id };
    Ok(success_response(query.execute(&state.db).await?))
}
