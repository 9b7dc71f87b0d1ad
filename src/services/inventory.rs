use crate::{
    db::DbPool,
    entities::{
        inventory_movement::{self, Entity as InventoryMovement},
        movement_type::{self, Entity as MovementType},
        product_variant::{self, Entity as ProductVariant},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Classification of a stock movement. Maps to seeded rows in the
/// movement_types table; only `CustomerSale` enforces the non-negative
/// stock floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    CustomerSale,
    Purchase,
    CustomerReturn,
    Adjustment,
}

impl MovementKind {
    pub fn as_code(&self) -> &'static str {
        match self {
            MovementKind::CustomerSale => "customer_sale",
            MovementKind::Purchase => "purchase",
            MovementKind::CustomerReturn => "customer_return",
            MovementKind::Adjustment => "adjustment",
        }
    }
}

/// One stock delta to apply inside an enclosing transaction.
#[derive(Debug, Clone)]
pub struct MovementInput {
    pub variant_id: Uuid,
    /// Signed delta. Negative for sales, positive for receipts.
    pub quantity: i32,
    /// Overrides the variant's recorded cost when present.
    pub unit_cost: Option<Decimal>,
    pub sale_id: Option<Uuid>,
    pub purchase_id: Option<Uuid>,
    pub return_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReceiveStockRequest {
    pub variant_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_cost: Option<Decimal>,
    pub purchase_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdjustStockRequest {
    pub variant_id: Uuid,
    /// Signed correction. May drive the stock negative; zero is rejected.
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MovementListResponse {
    pub movements: Vec<inventory_movement::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Inventory ledger: every stock change goes through `apply_movement`, which
/// pairs the variant update with an immutable movement row.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Resolves a movement type by its seeded code. A missing row means the
    /// deployment is broken, so this is a configuration error rather than a
    /// not-found: the enclosing transaction must abort and nothing retries.
    pub async fn resolve_movement_type<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: MovementKind,
    ) -> Result<movement_type::Model, ServiceError> {
        MovementType::find()
            .filter(movement_type::Column::Code.eq(kind.as_code()))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                error!(
                    code = kind.as_code(),
                    "Movement type missing from reference data"
                );
                ServiceError::Configuration(format!(
                    "Movement type '{}' is not seeded",
                    kind.as_code()
                ))
            })
    }

    /// Applies one stock delta inside the caller's transaction: reads the
    /// variant, bounds the delta, enforces the sale-path floor, writes the
    /// new quantity and inserts the movement row. Exactly one update and one
    /// insert; the caller owns commit and rollback.
    pub async fn apply_movement(
        &self,
        txn: &DatabaseTransaction,
        movement_type: &movement_type::Model,
        input: MovementInput,
    ) -> Result<inventory_movement::Model, ServiceError> {
        let magnitude = input.quantity.checked_abs().ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Movement quantity {} is out of range",
                input.quantity
            ))
        })?;

        let variant = ProductVariant::find_by_id(input.variant_id)
            .one(txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Variant {} not found", input.variant_id))
            })?;

        let stock_before = variant.stock_quantity;
        let new_stock = stock_before.checked_add(input.quantity).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Movement of {} overflows the stock level {} of variant '{}'",
                input.quantity, stock_before, variant.sku
            ))
        })?;

        if movement_type.code == MovementKind::CustomerSale.as_code() && new_stock < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "Variant '{}' has {} units in stock, requested {}",
                variant.sku, stock_before, magnitude
            )));
        }

        let now = Utc::now();
        let unit_cost = input.unit_cost.unwrap_or(variant.cost);
        let total_value = Decimal::from(magnitude) * unit_cost;
        let min_stock = variant.min_stock;
        let sku = variant.sku.clone();

        let mut active_variant: product_variant::ActiveModel = variant.into();
        active_variant.stock_quantity = Set(new_stock);
        active_variant.updated_at = Set(now);
        active_variant
            .update(txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if new_stock < min_stock {
            warn!(
                variant_id = %input.variant_id,
                sku = %sku,
                stock = new_stock,
                min_stock = min_stock,
                "Stock fell below the minimum level"
            );
        }

        let movement = inventory_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            variant_id: Set(input.variant_id),
            movement_type_id: Set(movement_type.id),
            quantity: Set(input.quantity),
            stock_before: Set(stock_before),
            stock_after: Set(new_stock),
            unit_cost: Set(unit_cost),
            total_value: Set(total_value),
            sale_id: Set(input.sale_id),
            purchase_id: Set(input.purchase_id),
            return_id: Set(input.return_id),
            notes: Set(input.notes),
            created_by: Set(input.created_by),
            created_at: Set(now),
        };

        let movement = movement
            .insert(txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(
            variant_id = %input.variant_id,
            movement_type = %movement_type.code,
            quantity = input.quantity,
            stock_after = new_stock,
            "Recorded inventory movement"
        );

        Ok(movement)
    }

    /// Books received goods against a variant (purchase direction).
    #[instrument(skip(self, request), fields(variant_id = %request.variant_id, quantity = request.quantity))]
    pub async fn receive_stock(
        &self,
        request: ReceiveStockRequest,
        received_by: Uuid,
    ) -> Result<inventory_movement::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start stock receipt transaction");
            ServiceError::DatabaseError(e)
        })?;

        let movement_type = self
            .resolve_movement_type(&txn, MovementKind::Purchase)
            .await?;

        let movement = self
            .apply_movement(
                &txn,
                &movement_type,
                MovementInput {
                    variant_id: request.variant_id,
                    quantity: request.quantity,
                    unit_cost: request.unit_cost,
                    sale_id: None,
                    purchase_id: request.purchase_id,
                    return_id: None,
                    notes: request.notes,
                    created_by: received_by,
                },
            )
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, variant_id = %request.variant_id, "Failed to commit stock receipt");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::StockReceived {
                    variant_id: movement.variant_id,
                    movement_id: movement.id,
                    quantity: movement.quantity,
                    stock_after: movement.stock_after,
                })
                .await
            {
                warn!(error = %e, variant_id = %movement.variant_id, "Failed to send stock received event");
            }
        }

        Ok(movement)
    }

    /// Posts an administrative stock correction. Unlike the sale path this
    /// may drive the quantity negative; the movement row keeps the audit
    /// trail either way.
    #[instrument(skip(self, request), fields(variant_id = %request.variant_id, quantity = request.quantity))]
    pub async fn adjust_stock(
        &self,
        request: AdjustStockRequest,
        adjusted_by: Uuid,
    ) -> Result<inventory_movement::Model, ServiceError> {
        if request.quantity == 0 {
            return Err(ServiceError::ValidationError(
                "Adjustment quantity cannot be zero".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start stock adjustment transaction");
            ServiceError::DatabaseError(e)
        })?;

        let movement_type = self
            .resolve_movement_type(&txn, MovementKind::Adjustment)
            .await?;

        let movement = self
            .apply_movement(
                &txn,
                &movement_type,
                MovementInput {
                    variant_id: request.variant_id,
                    quantity: request.quantity,
                    unit_cost: None,
                    sale_id: None,
                    purchase_id: None,
                    return_id: None,
                    notes: request.notes,
                    created_by: adjusted_by,
                },
            )
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, variant_id = %request.variant_id, "Failed to commit stock adjustment");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::StockAdjusted {
                    variant_id: movement.variant_id,
                    movement_id: movement.id,
                    quantity: movement.quantity,
                    stock_after: movement.stock_after,
                })
                .await
            {
                warn!(error = %e, variant_id = %movement.variant_id, "Failed to send stock adjusted event");
            }
        }

        Ok(movement)
    }

    /// Lists a variant's movement history, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        variant_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<MovementListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let paginator = InventoryMovement::find()
            .filter(inventory_movement::Column::VariantId.eq(variant_id))
            .order_by_desc(inventory_movement::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, variant_id = %variant_id, "Failed to count inventory movements");
            ServiceError::DatabaseError(e)
        })?;

        let movements = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, variant_id = %variant_id, "Failed to fetch inventory movements page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(MovementListResponse {
            movements,
            total,
            page,
            per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_kind_codes_match_seeded_rows() {
        assert_eq!(MovementKind::CustomerSale.as_code(), "customer_sale");
        assert_eq!(MovementKind::Purchase.as_code(), "purchase");
        assert_eq!(MovementKind::CustomerReturn.as_code(), "customer_return");
        assert_eq!(MovementKind::Adjustment.as_code(), "adjustment");
    }
}
