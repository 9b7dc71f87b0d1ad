use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable audit row recording one stock change on a variant. Written once
/// alongside the variant update, never edited afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub variant_id: Uuid,
    pub movement_type_id: Uuid,
    /// Signed delta applied to the variant's stock. Negative for sales.
    pub quantity: i32,
    pub stock_before: i32,
    pub stock_after: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_value: Decimal,
    pub sale_id: Option<Uuid>,
    pub purchase_id: Option<Uuid>,
    pub return_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
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
    #[sea_orm(
        belongs_to = "super::movement_type::Entity",
        from = "Column::MovementTypeId",
        to = "super::movement_type::Column::Id"
    )]
    MovementType,
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariant.def()
    }
}

impl Related<super::movement_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
