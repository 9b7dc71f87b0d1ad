use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-customer credit rollup, maintained transactionally alongside every
/// credit write. Reads must be able to trust it without recomputing from the
/// credit rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_credit_summaries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub customer_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_extended: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_outstanding: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_repaid: Decimal,
    pub active_credits: i32,
    pub paid_credits: i32,
    pub last_credit_at: Option<DateTime<Utc>>,
    pub last_payment_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
