//! Database entities backing the catalog, order and inventory ledger tables.

pub mod inventory_log;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_variant;

pub use inventory_log::{Entity as InventoryLog, InventoryLogType, Model as InventoryLogModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
