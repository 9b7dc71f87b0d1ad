use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum DiscountStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
    #[sea_orm(string_value = "Expired")]
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum DiscountKind {
    #[sea_orm(string_value = "Percentage")]
    Percentage,
    #[sea_orm(string_value = "FixedAmount")]
    FixedAmount,
}

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum DiscountScope {
    #[sea_orm(string_value = "Sale")]
    Sale,
    #[sea_orm(string_value = "Category")]
    Category,
    #[sea_orm(string_value = "Product")]
    Product,
    #[sea_orm(string_value = "Customer")]
    Customer,
}

/// Discount campaign or coupon. `usage_count` is incremented only by a
/// successful application; `status` flips to Expired lazily when validation
/// observes a past `ends_at`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Coupon code. Campaigns applied without a code carry none.
    #[sea_orm(unique)]
    pub code: Option<String>,
    pub scope: DiscountScope,
    pub kind: DiscountKind,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub value: Decimal,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub min_purchase_amount: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub max_uses_per_customer: Option<i32>,
    pub usage_count: i32,
    pub status: DiscountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::discount_usage::Entity")]
    Usages,
    #[sea_orm(has_many = "super::discount_history::Entity")]
    History,
}

impl Related<super::discount_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usages.def()
    }
}

impl Related<super::discount_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
