// Adjustment engine: the only writer of variant stock
pub mod inventory_adjustment_service;

// Order lifecycle: placement and the status reconciler
pub mod order_status;
pub mod orders;

// Catalog entries that hold stock
pub mod product_catalog_service;
