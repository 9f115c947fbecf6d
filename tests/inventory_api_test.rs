mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn adjust_endpoint_wraps_result_in_success_envelope() {
    let app = TestApp::new().await;
    let variant = app.seed_variant("API-TEE", 5).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/adjust",
            Some(json!({
                "variant_id": variant.id,
                "change": -2,
                "type": "DAMAGED_LOST",
                "note": "water damage"
            })),
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["variant"]["stock"], json!(3));
    assert_eq!(body["data"]["log"]["change"], json!(-2));
    assert_eq!(body["data"]["log"]["resulting_stock"], json!(3));
    assert_eq!(body["data"]["log"]["log_type"], json!("DAMAGED_LOST"));
    assert_eq!(
        body["data"]["log"]["admin_id"],
        json!(app.admin_id.to_string())
    );
}

#[tokio::test]
async fn insufficient_stock_is_a_failure_envelope() {
    let app = TestApp::new().await;
    let variant = app.seed_variant("API-MUG", 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/adjust",
            Some(json!({ "variant_id": variant.id, "change": -2 })),
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("Insufficient stock"), "{}", message);
}

#[tokio::test]
async fn admin_routes_require_a_valid_session() {
    let app = TestApp::new().await;

    let anonymous = app
        .request_public(Method::GET, "/api/v1/inventory/low-stock", None)
        .await;
    let (status, body) = response_json(anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));

    let authorized = app
        .request(Method::GET, "/api/v1/inventory/low-stock", None)
        .await;
    assert_eq!(authorized.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_body_reports_field_errors() {
    let app = TestApp::new().await;
    let variant = app.seed_variant("API-CAP", 4).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/adjust",
            Some(json!({ "variant_id": variant.id, "change": 0 })),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["change"].is_array());

    let malformed = app
        .request(
            Method::POST,
            "/api/v1/inventory/adjust",
            Some(json!({ "variant_id": "not-a-uuid", "change": 1 })),
        )
        .await;
    let (status, body) = response_json(malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn public_checkout_flow() {
    let app = TestApp::new().await;
    let variant = app.seed_variant("API-HOODIE", 3).await;

    let placed = app
        .request_public(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_email": "shopper@example.com",
                "items": [{ "variant_id": variant.id, "quantity": 2 }]
            })),
        )
        .await;
    let (status, body) = response_json(placed).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["order"]["status"], json!("PENDING"));
    let order_id = body["data"]["order"]["id"].as_str().unwrap().to_string();

    let fetched = app
        .request_public(Method::GET, &format!("/api/v1/variants/{}", variant.id), None)
        .await;
    let (status, body) = response_json(fetched).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock"], json!(1));

    let cancelled = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", order_id),
            Some(json!({ "status": "CANCELLED" })),
        )
        .await;
    let (status, body) = response_json(cancelled).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], json!("CANCELLED"));
    assert_eq!(body["data"]["restored"].as_array().unwrap().len(), 1);

    let audit = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory/variants/{}/audit", variant.id),
            None,
        )
        .await;
    let (_, body) = response_json(audit).await;
    assert_eq!(body["data"]["stock"], json!(3));
    assert_eq!(body["data"]["consistent"], json!(true));
}

#[tokio::test]
async fn admin_can_create_catalog_entries() {
    let app = TestApp::new().await;

    let product = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "Classic Tee" })),
        )
        .await;
    let (status, body) = response_json(product).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], json!("classic-tee"));
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    let variant = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{}/variants", product_id),
            Some(json!({
                "sku": "TEE-CLASSIC-M",
                "name": "Medium",
                "price": "24.00",
                "initial_stock": 12
            })),
        )
        .await;
    let (status, body) = response_json(variant).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["variant"]["stock"], json!(12));
    assert_eq!(body["data"]["initial_log"]["log_type"], json!("RESTOCK"));

    let missing_product = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{}/variants", Uuid::new_v4()),
            Some(json!({ "sku": "NOPE", "name": "Nope", "price": "1.00" })),
        )
        .await;
    assert_eq!(missing_product.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_and_ids_use_the_envelope() {
    let app = TestApp::new().await;

    let (status, body) =
        response_json(app.request(Method::GET, "/api/v1/nope", None).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, body) = response_json(
        app.request_public(
            Method::GET,
            &format!("/api/v1/variants/{}", Uuid::new_v4()),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, _) =
        response_json(app.request_public(Method::GET, "/api/v1/variants/abc", None).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let app = TestApp::new().await;

    let (status, body) = response_json(app.request_public(Method::GET, "/health", None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("healthy"));

    let metrics = app.request_public(Method::GET, "/metrics", None).await;
    assert_eq!(metrics.status(), StatusCode::OK);
}
