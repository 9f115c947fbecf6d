#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use storefront_api::{
    auth::SessionKeys,
    config::AppConfig,
    db::{self, DbPool},
    entities::{product, product_variant},
    services::product_catalog_service::{NewProduct, NewVariant, ProductCatalogService},
    build_router, AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_storefront_admin_sessions_only";

/// Helper harness for spinning up an application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin_id: Uuid,
    token: String,
}

/// In-memory SQLite with a single long-lived connection, migrated.
pub async fn test_db() -> Arc<DbPool> {
    let mut cfg = test_config();
    // Every pooled connection to `sqlite::memory:` is its own database.
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;
    cfg.db_idle_timeout_secs = 3_600;

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .expect("failed to create test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");
    Arc::new(pool)
}

/// File-backed SQLite shared by `connections` pooled connections, migrated.
/// Writers contend on the database lock the way they would in production; keep
/// the returned directory alive for as long as the pool is used.
pub async fn shared_test_db(connections: u32) -> (Arc<DbPool>, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut cfg = test_config();
    cfg.database_url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("storefront.db").display()
    );
    cfg.db_max_connections = connections;
    cfg.db_min_connections = 1;

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .expect("failed to create shared test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");
    (Arc::new(pool), dir)
}

pub fn test_config() -> AppConfig {
    AppConfig::new(
        "sqlite::memory:".to_string(),
        TEST_JWT_SECRET.to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    )
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db = test_db().await;
        let state = AppState::new(db, test_config());
        let router = build_router(state.clone());

        let admin_id = Uuid::new_v4();
        let token = SessionKeys::new(TEST_JWT_SECRET)
            .issue(
                admin_id,
                Some("Test Admin".to_string()),
                chrono::Duration::hours(1),
            )
            .expect("sign test token");

        Self {
            router,
            state,
            admin_id,
            token,
        }
    }

    pub fn db(&self) -> Arc<DbPool> {
        self.state.db.clone()
    }

    /// Sends a request with the admin bearer token attached.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.send(method, uri, body, true).await
    }

    /// Sends a request without credentials.
    pub async fn request_public(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.send(method, uri, body, false).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        authorized: bool,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if authorized {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router call")
    }

    /// Seeds a product with one variant holding `stock` units.
    pub async fn seed_variant(&self, sku: &str, stock: i32) -> product_variant::Model {
        seed_variant(&self.state.db, sku, stock).await.1
    }
}

pub async fn seed_product(db: &Arc<DbPool>, name: &str) -> product::Model {
    ProductCatalogService::new(db.clone())
        .create_product(NewProduct {
            name: name.to_string(),
            slug: None,
            description: None,
            is_active: true,
        })
        .await
        .expect("seed product")
}

pub async fn seed_variant_for(
    db: &Arc<DbPool>,
    product_id: Uuid,
    sku: &str,
    stock: i32,
) -> product_variant::Model {
    ProductCatalogService::new(db.clone())
        .create_variant(
            product_id,
            NewVariant {
                sku: sku.to_string(),
                name: format!("{} variant", sku),
                price: Decimal::new(1999, 2),
                compare_at_price: None,
                initial_stock: stock,
            },
        )
        .await
        .expect("seed variant")
        .variant
}

/// Creates a product named after `sku` and one variant with `stock` units.
pub async fn seed_variant(
    db: &Arc<DbPool>,
    sku: &str,
    stock: i32,
) -> (product::Model, product_variant::Model) {
    let product = seed_product(db, &format!("Product {}", sku)).await;
    let variant = seed_variant_for(db, product.id, sku, stock).await;
    (product, variant)
}

pub async fn response_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
