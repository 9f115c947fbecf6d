use crate::{
    auth::AdminSession,
    commands::{orders::CreateOrderCommand, orders::UpdateOrderStatusCommand, Command},
    errors::{ErrorResponse, ServiceError},
    handlers::common::{created_response, json_body, path_id, success_response},
    services::{
        order_status::StatusChangeOutcome,
        orders::{OrderDetails, PlacedOrder},
    },
    ApiResponse, AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    response::IntoResponse,
};
use uuid::Uuid;

/// Place an order, reserving stock for every line
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderCommand,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<PlacedOrder>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Variant not found", body = ErrorResponse),
        (status = 422, description = "Insufficient stock", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let command = json_body(payload)?;
    let placed = command.execute(state.db.clone()).await?;
    Ok(created_response(placed))
}

/// Get an order with its line items
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = ApiResponse<OrderDetails>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _session: AdminSession,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let order_id = path_id(path)?;
    let order = state.services.orders.get_order(order_id).await?;
    Ok(success_response(order))
}

/// Set an order's status; cancelling returns its stock
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusCommand,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<StatusChangeOutcome>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    session: AdminSession,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateOrderStatusCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let order_id = path_id(path)?;
    let command = json_body(payload)?.for_order(order_id, session.admin_id);
    let outcome = command.execute(state.db.clone()).await?;
    Ok(success_response(outcome))
}
