use crate::{
    db::DbPool,
    entities::{
        discount::{self, DiscountKind, DiscountStatus, Entity as Discount},
        discount_history,
        discount_usage::{self, Entity as DiscountUsage},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Why a discount code was turned down. Ordered by evaluation step; the
/// first failing rule wins and later rules are not consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRejection {
    CodeNotFound,
    Inactive,
    NotYetActive,
    Expired,
    MinimumPurchaseNotMet,
    UsageLimitReached,
    CustomerLimitReached,
}

/// Outcome of evaluating a code against a purchase, used inside an
/// enclosing transaction. A rejection is a value, not an error: only the
/// caller knows whether it should abort anything.
#[derive(Debug, Clone)]
pub enum DiscountEvaluation {
    Approved {
        discount: discount::Model,
        value: Decimal,
    },
    Rejected {
        reason: DiscountRejection,
        message: String,
        discount_id: Option<Uuid>,
    },
}

/// Wire-facing validation result for the standalone endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscountValidation {
    Approved {
        discount_id: Uuid,
        code: String,
        kind: DiscountKind,
        value: Decimal,
    },
    Rejected {
        reason: DiscountRejection,
        message: String,
    },
}

impl DiscountValidation {
    pub fn is_approved(&self) -> bool {
        matches!(self, DiscountValidation::Approved { .. })
    }
}

/// Rule engine for discount codes. Evaluation is read-mostly (the one
/// exception is the lazy expiry flip); `apply` records consumption and is
/// only ever called inside a checkout transaction.
#[derive(Clone)]
pub struct DiscountService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl DiscountService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Computes the monetary value of a discount against a purchase amount.
    /// Percentage discounts are taken on the full amount; either kind is
    /// capped at the purchase amount so a discount can never push a sale
    /// negative.
    pub fn compute_value(&self, discount: &discount::Model, purchase_amount: Decimal) -> Decimal {
        let raw = match discount.kind {
            DiscountKind::Percentage => purchase_amount * discount.value / Decimal::from(100),
            DiscountKind::FixedAmount => discount.value,
        };
        raw.min(purchase_amount).max(Decimal::ZERO)
    }

    /// Runs the full rule chain for a code against a purchase. Rules fire in
    /// a fixed order: existence, status, activation window, expiry window,
    /// minimum purchase, global usage cap, per-customer cap. Writes nothing
    /// except the lazy expiry flip, which shares the caller's connection and
    /// therefore its transaction semantics.
    pub async fn evaluate<C: ConnectionTrait>(
        &self,
        conn: &C,
        code: &str,
        customer_id: Uuid,
        purchase_amount: Decimal,
    ) -> Result<DiscountEvaluation, ServiceError> {
        let now = Utc::now();

        let Some(found) = Discount::find()
            .filter(discount::Column::Code.eq(code))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
        else {
            return Ok(DiscountEvaluation::Rejected {
                reason: DiscountRejection::CodeNotFound,
                message: format!("Discount code '{}' not found", code),
                discount_id: None,
            });
        };

        match found.status {
            DiscountStatus::Inactive => {
                return Ok(DiscountEvaluation::Rejected {
                    reason: DiscountRejection::Inactive,
                    message: format!("Discount '{}' is inactive", found.name),
                    discount_id: Some(found.id),
                });
            }
            DiscountStatus::Expired => {
                return Ok(DiscountEvaluation::Rejected {
                    reason: DiscountRejection::Expired,
                    message: format!("Discount '{}' has expired", found.name),
                    discount_id: Some(found.id),
                });
            }
            DiscountStatus::Active => {}
        }

        if let Some(starts_at) = found.starts_at {
            if now < starts_at {
                return Ok(DiscountEvaluation::Rejected {
                    reason: DiscountRejection::NotYetActive,
                    message: format!("Discount '{}' is not active until {}", found.name, starts_at),
                    discount_id: Some(found.id),
                });
            }
        }

        if let Some(ends_at) = found.ends_at {
            if now > ends_at {
                let expired = self.expire_if_past_window(conn, found).await?;
                return Ok(DiscountEvaluation::Rejected {
                    reason: DiscountRejection::Expired,
                    message: format!("Discount '{}' expired on {}", expired.name, ends_at),
                    discount_id: Some(expired.id),
                });
            }
        }

        if let Some(min_purchase) = found.min_purchase_amount {
            if purchase_amount < min_purchase {
                return Ok(DiscountEvaluation::Rejected {
                    reason: DiscountRejection::MinimumPurchaseNotMet,
                    message: format!(
                        "Purchase amount {} is below the required minimum {}",
                        purchase_amount, min_purchase
                    ),
                    discount_id: Some(found.id),
                });
            }
        }

        if let Some(max_uses) = found.max_uses {
            if found.usage_count >= max_uses {
                return Ok(DiscountEvaluation::Rejected {
                    reason: DiscountRejection::UsageLimitReached,
                    message: format!("Discount '{}' has reached its usage limit", found.name),
                    discount_id: Some(found.id),
                });
            }
        }

        if let Some(per_customer) = found.max_uses_per_customer {
            let usage = DiscountUsage::find()
                .filter(discount_usage::Column::DiscountId.eq(found.id))
                .filter(discount_usage::Column::CustomerId.eq(customer_id))
                .one(conn)
                .await
                .map_err(ServiceError::DatabaseError)?;

            if let Some(usage) = usage {
                if usage.usage_count >= per_customer {
                    return Ok(DiscountEvaluation::Rejected {
                        reason: DiscountRejection::CustomerLimitReached,
                        message: format!(
                            "Customer has already used discount '{}' {} times",
                            found.name, usage.usage_count
                        ),
                        discount_id: Some(found.id),
                    });
                }
            }
        }

        let value = self.compute_value(&found, purchase_amount);
        Ok(DiscountEvaluation::Approved {
            discount: found,
            value,
        })
    }

    /// Reconciles a discount whose end date has passed but whose stored
    /// status still says Active. The write goes through the caller's
    /// connection: on the standalone validation path it commits immediately,
    /// inside a checkout it lives and dies with the sale transaction.
    async fn expire_if_past_window<C: ConnectionTrait>(
        &self,
        conn: &C,
        found: discount::Model,
    ) -> Result<discount::Model, ServiceError> {
        warn!(
            discount_id = %found.id,
            name = %found.name,
            "Discount is past its end date, marking it expired"
        );

        let mut active: discount::ActiveModel = found.into();
        active.status = Set(DiscountStatus::Expired);
        active.updated_at = Set(Utc::now());
        active
            .update(conn)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Standalone validation against live data, outside any sale. Runs on
    /// the pool, so a lazy expiry flip performed here is durable even though
    /// the caller is only asking a question.
    #[instrument(skip(self), fields(code = %code, customer_id = %customer_id))]
    pub async fn validate(
        &self,
        code: &str,
        customer_id: Uuid,
        purchase_amount: Decimal,
    ) -> Result<DiscountValidation, ServiceError> {
        let db = &*self.db_pool;

        match self.evaluate(db, code, customer_id, purchase_amount).await? {
            DiscountEvaluation::Approved { discount, value } => {
                info!(discount_id = %discount.id, value = %value, "Discount code validated");
                Ok(DiscountValidation::Approved {
                    discount_id: discount.id,
                    code: discount.code.unwrap_or_default(),
                    kind: discount.kind,
                    value,
                })
            }
            DiscountEvaluation::Rejected {
                reason,
                message,
                discount_id,
            } => {
                info!(reason = ?reason, "Discount code rejected");

                if reason == DiscountRejection::Expired {
                    if let (Some(event_sender), Some(discount_id)) =
                        (&self.event_sender, discount_id)
                    {
                        if let Err(e) = event_sender.send(Event::DiscountExpired(discount_id)).await
                        {
                            warn!(error = %e, discount_id = %discount_id, "Failed to send discount expired event");
                        }
                    }
                }

                Ok(DiscountValidation::Rejected { reason, message })
            }
        }
    }

    /// Records consumption of an approved discount inside the caller's
    /// checkout transaction: bumps the global counter, upserts the
    /// per-customer usage row and appends one history row. `forced_value`
    /// lets the caller pin the recorded value to what the sale actually
    /// carried instead of recomputing it. Returns the value recorded.
    pub async fn apply(
        &self,
        txn: &DatabaseTransaction,
        discount: &discount::Model,
        customer_id: Uuid,
        sale_id: Uuid,
        purchase_amount: Decimal,
        forced_value: Option<Decimal>,
    ) -> Result<Decimal, ServiceError> {
        let now = Utc::now();
        let applied_value =
            forced_value.unwrap_or_else(|| self.compute_value(discount, purchase_amount));

        let mut active: discount::ActiveModel = discount.clone().into();
        active.usage_count = Set(discount.usage_count + 1);
        active.updated_at = Set(now);
        active
            .update(txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let existing = DiscountUsage::find()
            .filter(discount_usage::Column::DiscountId.eq(discount.id))
            .filter(discount_usage::Column::CustomerId.eq(customer_id))
            .one(txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        match existing {
            Some(usage) => {
                let count = usage.usage_count;
                let mut active_usage: discount_usage::ActiveModel = usage.into();
                active_usage.usage_count = Set(count + 1);
                active_usage.last_used_at = Set(now);
                active_usage
                    .update(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
            }
            None => {
                discount_usage::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    discount_id: Set(discount.id),
                    customer_id: Set(customer_id),
                    usage_count: Set(1),
                    last_used_at: Set(now),
                    created_at: Set(now),
                }
                .insert(txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            }
        }

        discount_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            discount_id: Set(discount.id),
            sale_id: Set(sale_id),
            customer_id: Set(customer_id),
            applied_value: Set(applied_value),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        info!(
            discount_id = %discount.id,
            sale_id = %sale_id,
            applied_value = %applied_value,
            "Applied discount to sale"
        );

        Ok(applied_value)
    }
}
