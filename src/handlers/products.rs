use crate::{
    auth::AdminSession,
    commands::{products::CreateProductCommand, products::CreateVariantCommand, Command},
    entities::{product, product_variant},
    errors::{ErrorResponse, ServiceError},
    handlers::common::{created_response, json_body, path_id, success_response},
    services::product_catalog_service::CreatedVariant,
    ApiResponse, AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductCommand,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    session: AdminSession,
    payload: Result<Json<CreateProductCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let command = json_body(payload)?;
    let product = command.execute(state.db.clone()).await?;
    info!(admin_id = %session.admin_id, product_id = %product.id, "Product created via API");
    Ok(created_response(product))
}

/// Create a variant under a product, optionally with initial stock
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/variants",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = CreateVariantCommand,
    responses(
        (status = 201, description = "Variant created", body = ApiResponse<CreatedVariant>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_variant(
    State(state): State<AppState>,
    session: AdminSession,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateVariantCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let product_id = path_id(path)?;
    let command = json_body(payload)?.for_product(product_id);
    let created = command.execute(state.db.clone()).await?;
    info!(
        admin_id = %session.admin_id,
        variant_id = %created.variant.id,
        "Variant created via API"
    );
    Ok(created_response(created))
}

/// Get a variant with its current stock
#[utoipa::path(
    get,
    path = "/api/v1/variants/{id}",
    params(("id" = Uuid, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Variant found", body = ApiResponse<product_variant::Model>),
        (status = 404, description = "Variant not found", body = ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_variant(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let variant_id = path_id(path)?;
    let variant = state.services.product_catalog.get_variant(variant_id).await?;
    Ok(success_response(variant))
}
