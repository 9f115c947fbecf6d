use crate::{
    entities::{
        inventory_log::{self, Entity as InventoryLog, InventoryLogType},
        order::{self, OrderStatus},
        order_item::{self, Entity as OrderItem},
        product::{self, Entity as Product},
        product_variant::{self, Entity as ProductVariant},
    },
    errors::ServiceError,
    queries::Query,
    services::inventory_adjustment_service::checked_stock,
};
use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;
pub const DEFAULT_LEDGER_PAGE_SIZE: u64 = 50;
pub const MAX_LEDGER_PAGE_SIZE: u64 = 200;

/// Stock on hand for one variant, with its product for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StockLevel {
    pub variant_id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub sku: String,
    pub name: String,
    pub stock: i32,
}

impl StockLevel {
    fn from_pair(variant: product_variant::Model, product: Option<product::Model>) -> Self {
        Self {
            variant_id: variant.id,
            product_id: variant.product_id,
            product_name: product.map(|p| p.name),
            sku: variant.sku,
            name: variant.name,
            stock: variant.stock,
        }
    }
}

/// Variants with `0 < stock <= threshold`, lowest stock first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLowStockQuery {
    pub threshold: i32,
}

impl Default for GetLowStockQuery {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

#[async_trait]
impl Query for GetLowStockQuery {
    type Result = Vec<StockLevel>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        if self.threshold < 0 {
            return Err(ServiceError::ValidationError(format!(
                "Low stock threshold must not be negative, got {}",
                self.threshold
            )));
        }

        let rows = ProductVariant::find()
            .find_also_related(Product)
            .filter(product_variant::Column::Stock.gt(0))
            .filter(product_variant::Column::Stock.lte(self.threshold))
            .order_by_asc(product_variant::Column::Stock)
            .order_by_asc(product_variant::Column::Sku)
            .all(db_pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(variant, product)| StockLevel::from_pair(variant, product))
            .collect())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetOutOfStockQuery;

#[async_trait]
impl Query for GetOutOfStockQuery {
    type Result = Vec<StockLevel>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let rows = ProductVariant::find()
            .find_also_related(Product)
            .filter(product_variant::Column::Stock.eq(0))
            .order_by_asc(product_variant::Column::Sku)
            .all(db_pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(variant, product)| StockLevel::from_pair(variant, product))
            .collect())
    }
}

/// How often an order emptied a product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct StockOutFrequency {
    pub product_id: Uuid,
    pub product_name: String,
    pub stock_outs: i64,
}

/// Counts ORDER_PLACED entries that left a variant at zero, grouped by product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetStockOutFrequencyQuery {
    pub limit: Option<u64>,
}

#[async_trait]
impl Query for GetStockOutFrequencyQuery {
    type Result = Vec<StockOutFrequency>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let stock_outs = Expr::col((inventory_log::Entity, inventory_log::Column::Id)).count();

        let mut select = InventoryLog::find()
            .select_only()
            .column_as(product::Column::Id, "product_id")
            .column_as(product::Column::Name, "product_name")
            .column_as(stock_outs.clone(), "stock_outs")
            .join(JoinType::InnerJoin, inventory_log::Relation::ProductVariant.def())
            .join(JoinType::InnerJoin, product_variant::Relation::Product.def())
            .filter(inventory_log::Column::LogType.eq(InventoryLogType::OrderPlaced))
            .filter(inventory_log::Column::ResultingStock.eq(0))
            .group_by(product::Column::Id)
            .group_by(product::Column::Name)
            .order_by_desc(stock_outs)
            .order_by_asc(product::Column::Name);

        if let Some(limit) = self.limit {
            select = select.limit(limit);
        }

        Ok(select
            .into_model::<StockOutFrequency>()
            .all(db_pool)
            .await?)
    }
}

/// Sales velocity of a variant relative to what it has on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VariantTurnover {
    pub variant_id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub stock: i32,
    pub sold: i64,
    /// `sold / (stock + sold)`, zero when both are zero.
    pub turnover_rate: f64,
}

/// Fraction of a variant's units that have left through fulfilled orders.
pub fn turnover_rate(stock: i32, sold: i64) -> f64 {
    let denominator = i64::from(stock) + sold;
    if denominator <= 0 {
        0.0
    } else {
        sold as f64 / denominator as f64
    }
}

#[derive(Debug, FromQueryResult)]
struct SoldUnits {
    variant_id: Uuid,
    sold: Option<i64>,
}

/// Per-variant turnover over SHIPPED and DELIVERED orders, slow movers first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetTurnoverQuery;

#[async_trait]
impl Query for GetTurnoverQuery {
    type Result = Vec<VariantTurnover>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let sold_statuses = [OrderStatus::Shipped, OrderStatus::Delivered];

        let sold: HashMap<Uuid, i64> = OrderItem::find()
            .select_only()
            .column(order_item::Column::VariantId)
            .column_as(
                Expr::col((order_item::Entity, order_item::Column::Quantity)).sum(),
                "sold",
            )
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .filter(order::Column::Status.is_in(sold_statuses))
            .group_by(order_item::Column::VariantId)
            .into_model::<SoldUnits>()
            .all(db_pool)
            .await?
            .into_iter()
            .map(|row| (row.variant_id, row.sold.unwrap_or(0)))
            .collect();

        let variants = ProductVariant::find()
            .order_by_asc(product_variant::Column::Sku)
            .all(db_pool)
            .await?;

        let mut report: Vec<VariantTurnover> = variants
            .into_iter()
            .map(|variant| {
                let sold = sold.get(&variant.id).copied().unwrap_or(0);
                VariantTurnover {
                    variant_id: variant.id,
                    product_id: variant.product_id,
                    turnover_rate: turnover_rate(variant.stock, sold),
                    sku: variant.sku,
                    stock: variant.stock,
                    sold,
                }
            })
            .collect();

        report.sort_by(|a, b| a.turnover_rate.total_cmp(&b.turnover_rate));
        Ok(report)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LedgerPage {
    pub entries: Vec<inventory_log::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// A variant's ledger, newest entry first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetVariantLedgerQuery {
    pub variant_id: Uuid,
    pub page: u64,
    pub per_page: u64,
}

impl GetVariantLedgerQuery {
    pub fn new(variant_id: Uuid, page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            variant_id,
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_LEDGER_PAGE_SIZE)
                .clamp(1, MAX_LEDGER_PAGE_SIZE),
        }
    }
}

async fn ensure_variant(db_pool: &DatabaseConnection, variant_id: Uuid) -> Result<product_variant::Model, ServiceError> {
    ProductVariant::find_by_id(variant_id)
        .one(db_pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product variant {} not found", variant_id)))
}

#[async_trait]
impl Query for GetVariantLedgerQuery {
    type Result = LedgerPage;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        ensure_variant(db_pool, self.variant_id).await?;

        let paginator = InventoryLog::find()
            .filter(inventory_log::Column::VariantId.eq(self.variant_id))
            .order_by_desc(inventory_log::Column::Sequence)
            .paginate(db_pool, self.per_page);

        let totals = paginator.num_items_and_pages().await?;
        let entries = paginator.fetch_page(self.page - 1).await?;

        Ok(LedgerPage {
            entries,
            total: totals.number_of_items,
            page: self.page,
            per_page: self.per_page,
            total_pages: totals.number_of_pages,
        })
    }
}

/// Result of folding a sequence of ledger deltas from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerReplay {
    pub sum: i64,
    /// False if any prefix of the ledger went below zero.
    pub never_negative: bool,
}

pub fn replay_ledger<I>(changes: I) -> LedgerReplay
where
    I: IntoIterator<Item = i32>,
{
    let mut sum: i64 = 0;
    let mut running = Some(0i32);
    for change in changes {
        sum += i64::from(change);
        running = running.and_then(|stock| checked_stock(stock, change));
    }
    LedgerReplay {
        sum,
        never_negative: running.is_some(),
    }
}

/// Consistency report for one variant's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LedgerAudit {
    pub variant_id: Uuid,
    pub stock: i32,
    pub entries: u64,
    pub ledger_sum: i64,
    pub latest_resulting_stock: Option<i32>,
    /// `stock` equals the sum of all changes.
    pub sum_matches: bool,
    /// The newest entry's `resulting_stock` equals `stock`.
    pub latest_matches: bool,
    pub never_negative: bool,
    pub consistent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditVariantLedgerQuery {
    pub variant_id: Uuid,
}

#[async_trait]
impl Query for AuditVariantLedgerQuery {
    type Result = LedgerAudit;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let variant = ensure_variant(db_pool, self.variant_id).await?;

        let logs = InventoryLog::find()
            .filter(inventory_log::Column::VariantId.eq(self.variant_id))
            .order_by_asc(inventory_log::Column::Sequence)
            .all(db_pool)
            .await?;

        let replay = replay_ledger(logs.iter().map(|log| log.change));
        let latest_resulting_stock = logs.last().map(|log| log.resulting_stock);

        let sum_matches = replay.sum == i64::from(variant.stock);
        let latest_matches = latest_resulting_stock.unwrap_or(0) == variant.stock;

        Ok(LedgerAudit {
            variant_id: variant.id,
            stock: variant.stock,
            entries: logs.len() as u64,
            ledger_sum: replay.sum,
            latest_resulting_stock,
            sum_matches,
            latest_matches,
            never_negative: replay.never_negative,
            consistent: sum_matches && latest_matches && replay.never_negative,
        })
    }
}
