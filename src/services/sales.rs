use crate::{
    db::DbPool,
    entities::{
        credit, payment,
        payment_method::{Entity as PaymentMethod, PaymentCategory},
        sale::{self, Entity as Sale, PaymentStatus},
        sale_line,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        credits::{CreditService, OpenCreditInput},
        discounts::{DiscountEvaluation, DiscountRejection, DiscountService},
        inventory::{InventoryService, MovementInput, MovementKind},
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineInput {
    pub variant_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_discount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalePaymentInput {
    pub payment_method_id: Uuid,
    pub amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateSaleRequest {
    pub customer_id: Option<Uuid>,
    pub seller_id: Uuid,
    #[validate(length(min = 1, message = "At least one line item is required"))]
    pub lines: Vec<SaleLineInput>,
    /// Tenders taken at checkout. May be empty: an unpaid sale posts as a
    /// receivable with its full balance due.
    pub payments: Vec<SalePaymentInput>,
    /// Caller-computed subtotal. Trusted when present; divergence from the
    /// line items is logged and flagged, not corrected.
    pub subtotal: Option<Decimal>,
    /// Sale-level discount total. Defaults to the sum of line discounts.
    pub discount_total: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub discount_code: Option<String>,
    pub notes: Option<String>,
}

/// One line with its derived amounts, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltLine {
    pub variant_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_discount: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// Output of the pure totals pass over a checkout request.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleTotals {
    pub customer_id: Uuid,
    pub lines: Vec<BuiltLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount_total: Decimal,
    pub line_discount_total: Decimal,
    pub total: Decimal,
    pub total_paid: Decimal,
    pub balance_due: Decimal,
    pub subtotal_diverged: bool,
}

#[derive(Debug, Serialize)]
pub struct SaleReceipt {
    pub sale: sale::Model,
    pub lines: Vec<sale_line::Model>,
    pub payments: Vec<payment::Model>,
    pub credit: Option<credit::Model>,
    pub discount_applied: Option<Decimal>,
    pub subtotal_diverged: bool,
}

#[derive(Debug, Serialize)]
pub struct SaleDetails {
    pub sale: sale::Model,
    pub lines: Vec<sale_line::Model>,
    pub payments: Vec<payment::Model>,
    pub credit: Option<credit::Model>,
}

/// Computes every derived amount of a sale without touching the database.
/// The caller-supplied subtotal wins over the computed one; when the two
/// disagree beyond `tolerance` the result is flagged for the caller and a
/// structured warning is emitted, but the supplied value stands.
pub fn build_sale_totals(
    request: &CreateSaleRequest,
    tolerance: Decimal,
) -> Result<SaleTotals, ServiceError> {
    let customer_id = request
        .customer_id
        .ok_or_else(|| ServiceError::ValidationError("Customer is required".to_string()))?;

    if request.lines.is_empty() {
        return Err(ServiceError::ValidationError(
            "At least one line item is required".to_string(),
        ));
    }

    let mut computed_subtotal = Decimal::ZERO;
    let mut line_discount_total = Decimal::ZERO;
    let mut lines = Vec::with_capacity(request.lines.len());

    for (index, line) in request.lines.iter().enumerate() {
        if line.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "Line {}: quantity must be at least 1",
                index + 1
            )));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Line {}: unit price cannot be negative",
                index + 1
            )));
        }

        let line_discount = line.line_discount.unwrap_or(Decimal::ZERO);
        if line_discount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Line {}: discount cannot be negative",
                index + 1
            )));
        }

        let line_subtotal = Decimal::from(line.quantity) * line.unit_price;
        if line_discount > line_subtotal {
            return Err(ServiceError::ValidationError(format!(
                "Line {}: discount {} exceeds the line subtotal {}",
                index + 1,
                line_discount,
                line_subtotal
            )));
        }

        computed_subtotal += line_subtotal;
        line_discount_total += line_discount;
        lines.push(BuiltLine {
            variant_id: line.variant_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_discount,
            subtotal: line_subtotal,
            total: line_subtotal - line_discount,
        });
    }

    let mut subtotal_diverged = false;
    let subtotal = match request.subtotal {
        Some(provided) => {
            if (provided - computed_subtotal).abs() > tolerance {
                warn!(
                    provided = %provided,
                    computed = %computed_subtotal,
                    "Caller-supplied subtotal diverges from the line items"
                );
                subtotal_diverged = true;
            }
            provided
        }
        None => computed_subtotal,
    };

    let tax = request.tax.unwrap_or(Decimal::ZERO);
    if tax < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Tax cannot be negative".to_string(),
        ));
    }

    let discount_total = request.discount_total.unwrap_or(line_discount_total);
    if discount_total < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Discount total cannot be negative".to_string(),
        ));
    }

    let total = subtotal + tax - discount_total;
    if total < Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "Sale total cannot be negative, got {}",
            total
        )));
    }

    let mut total_paid = Decimal::ZERO;
    for (index, payment) in request.payments.iter().enumerate() {
        if payment.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Payment {}: amount must be positive",
                index + 1
            )));
        }
        total_paid += payment.amount;
    }

    if total_paid > total {
        return Err(ServiceError::ValidationError(format!(
            "Payments {} exceed the sale total {}",
            total_paid, total
        )));
    }

    Ok(SaleTotals {
        customer_id,
        lines,
        subtotal,
        tax,
        discount_total,
        line_discount_total,
        total,
        total_paid,
        balance_due: total - total_paid,
        subtotal_diverged,
    })
}

fn payment_status_for(amount_paid: Decimal, balance_due: Decimal) -> PaymentStatus {
    if balance_due.is_zero() {
        PaymentStatus::Paid
    } else if amount_paid.is_zero() {
        PaymentStatus::Pending
    } else {
        PaymentStatus::Partial
    }
}

fn next_sale_number(sale_id: Uuid) -> String {
    format!("SALE-{}", sale_id.to_string()[..8].to_uppercase())
}

/// Checkout orchestrator. One sale is one transaction: lines, stock
/// movements, payments, credit and discount bookkeeping either all land or
/// none do.
#[derive(Clone)]
pub struct SaleService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    inventory_service: Arc<InventoryService>,
    discount_service: Arc<DiscountService>,
    credit_service: Arc<CreditService>,
    subtotal_tolerance: Decimal,
}

impl SaleService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        inventory_service: Arc<InventoryService>,
        discount_service: Arc<DiscountService>,
        credit_service: Arc<CreditService>,
        subtotal_tolerance: Decimal,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            inventory_service,
            discount_service,
            credit_service,
            subtotal_tolerance,
        }
    }

    /// Runs a full checkout. Stage order inside the transaction: sale and
    /// lines, stock movements, payments, store-credit reclassification,
    /// discount consumption. Any error rolls back everything; there is no
    /// partial success and no retry.
    #[instrument(skip(self, request), fields(seller_id = %request.seller_id, line_count = request.lines.len()))]
    pub async fn create_sale(
        &self,
        request: CreateSaleRequest,
        acting_user: Uuid,
    ) -> Result<SaleReceipt, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let totals = build_sale_totals(&request, self.subtotal_tolerance)?;

        let sale_id = Uuid::new_v4();
        let sale_number = next_sale_number(sale_id);
        let now = Utc::now();

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start checkout transaction");
            ServiceError::DatabaseError(e)
        })?;

        let sale_active = sale::ActiveModel {
            id: Set(sale_id),
            sale_number: Set(sale_number.clone()),
            customer_id: Set(totals.customer_id),
            seller_id: Set(request.seller_id),
            status: Set("completed".to_string()),
            subtotal: Set(totals.subtotal),
            tax: Set(totals.tax),
            discount_total: Set(totals.discount_total),
            total: Set(totals.total),
            amount_paid: Set(totals.total_paid),
            balance_due: Set(totals.balance_due),
            payment_status: Set(payment_status_for(totals.total_paid, totals.balance_due)),
            discount_id: Set(None),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let mut sale_model = sale_active
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut line_models = Vec::with_capacity(totals.lines.len());
        for line in &totals.lines {
            let line_active = sale_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                variant_id: Set(line.variant_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_discount: Set(line.line_discount),
                subtotal: Set(line.subtotal),
                total: Set(line.total),
                created_at: Set(now),
            };
            line_models.push(
                line_active
                    .insert(&txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?,
            );
        }

        let sale_movement_type = self
            .inventory_service
            .resolve_movement_type(&txn, MovementKind::CustomerSale)
            .await?;

        for line in &totals.lines {
            self.inventory_service
                .apply_movement(
                    &txn,
                    &sale_movement_type,
                    MovementInput {
                        variant_id: line.variant_id,
                        quantity: -line.quantity,
                        unit_cost: None,
                        sale_id: Some(sale_id),
                        purchase_id: None,
                        return_id: None,
                        notes: None,
                        created_by: acting_user,
                    },
                )
                .await?;
        }

        let mut payment_models = Vec::with_capacity(request.payments.len());
        let mut credit_total = Decimal::ZERO;
        let mut running_balance = totals.total;

        for payment_input in &request.payments {
            let method = PaymentMethod::find_by_id(payment_input.payment_method_id)
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Payment method {} not found",
                        payment_input.payment_method_id
                    ))
                })?;

            if !method.is_active {
                return Err(ServiceError::ValidationError(format!(
                    "Payment method '{}' is inactive",
                    method.name
                )));
            }

            if method.category == PaymentCategory::StoreCredit {
                credit_total += payment_input.amount;
            }

            let balance_after = running_balance - payment_input.amount;
            let payment_active = payment::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                amount: Set(payment_input.amount),
                payment_method_id: Set(method.id),
                balance_before: Set(running_balance),
                balance_after: Set(balance_after),
                kind: Set(payment::PaymentKind::Initial),
                notes: Set(payment_input.notes.clone()),
                received_by: Set(acting_user),
                created_at: Set(now),
            };
            payment_models.push(
                payment_active
                    .insert(&txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?,
            );
            running_balance = balance_after;
        }

        // A store-credit tender finances the sale instead of settling it:
        // the financed portion moves out of amount_paid and into a credit.
        let mut credit_model = None;
        if credit_total > Decimal::ZERO {
            let settled_paid = totals.total_paid - credit_total;
            let financed_balance = totals.total - settled_paid;

            let mut active_sale: sale::ActiveModel = sale_model.into();
            active_sale.amount_paid = Set(settled_paid);
            active_sale.balance_due = Set(financed_balance);
            active_sale.payment_status = Set(payment_status_for(settled_paid, financed_balance));
            active_sale.updated_at = Set(now);
            sale_model = active_sale
                .update(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;

            let credit = self
                .credit_service
                .open(
                    &txn,
                    OpenCreditInput {
                        sale_id,
                        customer_id: totals.customer_id,
                        principal: credit_total,
                        already_paid: settled_paid,
                        opened_by: acting_user,
                    },
                )
                .await?;
            credit_model = Some(credit);
        }

        let mut applied_discount = None;
        if let Some(code) = &request.discount_code {
            match self
                .discount_service
                .evaluate(&txn, code, totals.customer_id, totals.subtotal)
                .await?
            {
                DiscountEvaluation::Approved { discount, .. } => {
                    let forced_value =
                        (totals.discount_total - totals.line_discount_total).max(Decimal::ZERO);
                    let applied_value = self
                        .discount_service
                        .apply(
                            &txn,
                            &discount,
                            totals.customer_id,
                            sale_id,
                            totals.subtotal,
                            Some(forced_value),
                        )
                        .await?;

                    let mut active_sale: sale::ActiveModel = sale_model.into();
                    active_sale.discount_id = Set(Some(discount.id));
                    active_sale.updated_at = Set(now);
                    sale_model = active_sale
                        .update(&txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    applied_discount = Some((discount.id, applied_value));
                }
                DiscountEvaluation::Rejected {
                    reason, message, ..
                } => {
                    warn!(
                        reason = ?reason,
                        sale_number = %sale_number,
                        "Discount code rejected during checkout, aborting sale"
                    );
                    return Err(match reason {
                        DiscountRejection::UsageLimitReached
                        | DiscountRejection::CustomerLimitReached => {
                            ServiceError::Conflict(message)
                        }
                        DiscountRejection::CodeNotFound => ServiceError::NotFound(message),
                        _ => ServiceError::ValidationError(message),
                    });
                }
            }
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, sale_number = %sale_number, "Failed to commit checkout transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            sale_id = %sale_id,
            sale_number = %sale_number,
            customer_id = %totals.customer_id,
            total = %totals.total,
            amount_paid = %sale_model.amount_paid,
            balance_due = %sale_model.balance_due,
            "Completed sale"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::SaleCompleted {
                    sale_id,
                    sale_number: sale_number.clone(),
                    customer_id: totals.customer_id,
                    total: totals.total,
                })
                .await
            {
                warn!(error = %e, sale_id = %sale_id, "Failed to send sale completed event");
            }

            if let Some(credit) = &credit_model {
                if let Err(e) = event_sender
                    .send(Event::CreditOpened {
                        credit_id: credit.id,
                        sale_id,
                        customer_id: credit.customer_id,
                        principal: credit.principal,
                        due_date: credit.due_date,
                    })
                    .await
                {
                    warn!(error = %e, credit_id = %credit.id, "Failed to send credit opened event");
                }
            }

            if let Some((discount_id, applied_value)) = applied_discount {
                if let Err(e) = event_sender
                    .send(Event::DiscountApplied {
                        discount_id,
                        sale_id,
                        applied_value,
                    })
                    .await
                {
                    warn!(error = %e, discount_id = %discount_id, "Failed to send discount applied event");
                }
            }
        }

        Ok(SaleReceipt {
            sale: sale_model,
            lines: line_models,
            payments: payment_models,
            credit: credit_model,
            discount_applied: applied_discount.map(|(_, value)| value),
            subtotal_diverged: totals.subtotal_diverged,
        })
    }

    /// Fetches a sale with its lines, payments and credit, if any.
    #[instrument(skip(self))]
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<Option<SaleDetails>, ServiceError> {
        let db = &*self.db_pool;

        let Some(sale) = Sale::find_by_id(sale_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
        else {
            return Ok(None);
        };

        let lines = sale
            .find_related(sale_line::Entity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let payments = sale
            .find_related(payment::Entity)
            .order_by_asc(payment::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let credit = credit::Entity::find()
            .filter(credit::Column::SaleId.eq(sale_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(Some(SaleDetails {
            sale,
            lines,
            payments,
            credit,
        }))
    }
}
