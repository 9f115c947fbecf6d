use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of reasons a variant's stock can change.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryLogType {
    #[sea_orm(string_value = "ORDER_PLACED")]
    OrderPlaced,
    #[sea_orm(string_value = "ORDER_CANCELLED")]
    OrderCancelled,
    #[sea_orm(string_value = "MANUAL_ADJUSTMENT")]
    ManualAdjustment,
    #[sea_orm(string_value = "RESTOCK")]
    Restock,
    #[sea_orm(string_value = "DAMAGED_LOST")]
    DamagedLost,
}

/// Append-only ledger entry. Rows are inserted by the adjustment engine and
/// never updated or deleted; `order_id` and `admin_id` are lookup keys only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = InventoryLog)]
#[sea_orm(table_name = "inventory_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub variant_id: Uuid,
    /// Position in the variant's ledger, starting at 1 with no gaps.
    pub sequence: i64,
    pub change: i32,
    pub resulting_stock: i32,
    pub log_type: InventoryLogType,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub order_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_variant::Entity",
        from = "Column::VariantId",
        to = "super::product_variant::Column::Id"
    )]
    ProductVariant,
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
