use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
# Storefront inventory ledger

Admin and storefront endpoints for product variants, orders and the
append-only inventory ledger. Every stock change is recorded as a ledger
entry and stock can never go below zero.

## Authentication

Admin endpoints require a session token signed with the configured secret:

```
Authorization: Bearer <jwt>
```

## Responses

Successful calls return `{ "success": true, "data": ... }`; failures return
`{ "success": false, "error": { "message": ... } }`.
"#
    ),
    paths(
        handlers::products::create_product,
        handlers::products::create_variant,
        handlers::products::get_variant,
        handlers::inventory::adjust_inventory,
        handlers::inventory::bulk_adjust_inventory,
        handlers::inventory::low_stock,
        handlers::inventory::out_of_stock,
        handlers::inventory::stock_out_frequency,
        handlers::inventory::turnover,
        handlers::inventory::variant_logs,
        handlers::inventory::variant_audit,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::update_order_status,
    ),
    components(schemas(crate::errors::ErrorResponse, crate::errors::ErrorBody)),
    tags(
        (name = "products", description = "Catalog variants that hold stock"),
        (name = "inventory", description = "Stock adjustments and ledger reports"),
        (name = "orders", description = "Order placement and status")
    )
)]
pub struct ApiDocV1;

/// Serves the generated document at `/api-docs/openapi.json`.
pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDocV1::openapi()) }),
    )
}
