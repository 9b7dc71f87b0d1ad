use crate::{
    db::DbPool,
    entities::{
        credit::{self, CreditStatus, Entity as Credit},
        customer_credit_summary::{self, Entity as CustomerCreditSummary},
        payment::{self, PaymentKind},
        payment_method::Entity as PaymentMethod,
        sale::{self, Entity as Sale, PaymentStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Everything needed to open a credit inside a checkout transaction.
#[derive(Debug, Clone)]
pub struct OpenCreditInput {
    pub sale_id: Uuid,
    pub customer_id: Uuid,
    /// Portion of the sale financed on store credit.
    pub principal: Decimal,
    /// Portion settled with other tenders at checkout, logged for the audit
    /// trail only.
    pub already_paid: Decimal,
    pub opened_by: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepayCreditRequest {
    /// Checked against zero and the remaining balance before any write.
    pub amount: Decimal,
    pub payment_method_id: Uuid,
    pub notes: Option<String>,
}

/// Result of a repayment: the payment row that was written plus the state
/// the credit and its sale ended up in.
#[derive(Debug, Serialize)]
pub struct RepaymentResponse {
    pub payment: payment::Model,
    pub credit: credit::Model,
    pub sale_balance_due: Decimal,
    pub sale_payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct CreditListFilter {
    pub customer_id: Option<Uuid>,
    pub status: Option<CreditStatus>,
}

#[derive(Debug, Serialize)]
pub struct CreditListResponse {
    pub credits: Vec<credit::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Credit ledger: one credit per financed sale, repaid in installments
/// until the balance reaches zero. Repayments update the payment history,
/// the sale, the credit and the per-customer summary in one transaction.
#[derive(Clone)]
pub struct CreditService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    credit_term_days: i64,
}

impl CreditService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        credit_term_days: i64,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            credit_term_days,
        }
    }

    /// Opens a credit inside the caller's checkout transaction and rolls the
    /// principal into the customer's summary. The due date comes from the
    /// configured term, never from the request.
    pub async fn open(
        &self,
        txn: &DatabaseTransaction,
        input: OpenCreditInput,
    ) -> Result<credit::Model, ServiceError> {
        if input.principal <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Credit principal must be positive, got {}",
                input.principal
            )));
        }

        let now = Utc::now();
        let due_date = now + Duration::days(self.credit_term_days);

        let credit = credit::ActiveModel {
            id: Set(Uuid::new_v4()),
            sale_id: Set(input.sale_id),
            customer_id: Set(input.customer_id),
            principal: Set(input.principal),
            repaid: Set(Decimal::ZERO),
            balance: Set(input.principal),
            status: Set(CreditStatus::Active),
            opened_at: Set(now),
            due_date: Set(due_date),
            last_payment_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let credit = credit
            .insert(txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let existing = CustomerCreditSummary::find()
            .filter(customer_credit_summary::Column::CustomerId.eq(input.customer_id))
            .one(txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        match existing {
            Some(summary) => {
                let total_extended = summary.total_extended;
                let total_outstanding = summary.total_outstanding;
                let active_credits = summary.active_credits;

                let mut active: customer_credit_summary::ActiveModel = summary.into();
                active.total_extended = Set(total_extended + input.principal);
                active.total_outstanding = Set(total_outstanding + input.principal);
                active.active_credits = Set(active_credits + 1);
                active.last_credit_at = Set(Some(now));
                active.updated_at = Set(now);
                active
                    .update(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
            }
            None => {
                customer_credit_summary::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    customer_id: Set(input.customer_id),
                    total_extended: Set(input.principal),
                    total_repaid: Set(Decimal::ZERO),
                    total_outstanding: Set(input.principal),
                    active_credits: Set(1),
                    paid_credits: Set(0),
                    last_credit_at: Set(Some(now)),
                    last_payment_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            }
        }

        info!(
            credit_id = %credit.id,
            sale_id = %input.sale_id,
            customer_id = %input.customer_id,
            principal = %input.principal,
            already_paid = %input.already_paid,
            due_date = %due_date,
            opened_by = %input.opened_by,
            "Opened store credit"
        );

        Ok(credit)
    }

    /// Books a repayment against the credit attached to a sale. Guards run
    /// before any write: no credit, already settled, non-positive amount and
    /// overpayment all leave the ledger untouched. A repayment that zeroes
    /// the balance is recorded as a settlement, anything smaller as an
    /// installment; both update payment history, sale, credit and summary
    /// atomically.
    #[instrument(skip(self, request), fields(sale_id = %sale_id, amount = %request.amount))]
    pub async fn repay(
        &self,
        sale_id: Uuid,
        request: RepayCreditRequest,
        received_by: Uuid,
    ) -> Result<RepaymentResponse, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Repayment amount must be positive, got {}",
                request.amount
            )));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start repayment transaction");
            ServiceError::DatabaseError(e)
        })?;

        let credit = Credit::find()
            .filter(credit::Column::SaleId.eq(sale_id))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No credit found for sale {}", sale_id))
            })?;

        if credit.status == CreditStatus::Paid {
            return Err(ServiceError::AlreadyPaid(format!(
                "Credit for sale {} is already settled",
                sale_id
            )));
        }

        if request.amount > credit.balance {
            return Err(ServiceError::Overpayment(format!(
                "Repayment {} exceeds the remaining balance {}",
                request.amount, credit.balance
            )));
        }

        let method = PaymentMethod::find_by_id(request.payment_method_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Payment method {} not found",
                    request.payment_method_id
                ))
            })?;

        if !method.is_active {
            return Err(ServiceError::ValidationError(format!(
                "Payment method '{}' is inactive",
                method.name
            )));
        }

        let sale = Sale::find_by_id(credit.sale_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                error!(credit_id = %credit.id, sale_id = %credit.sale_id, "Credit points at a missing sale");
                ServiceError::InternalError(format!(
                    "Sale {} missing for credit {}",
                    credit.sale_id, credit.id
                ))
            })?;

        let now = Utc::now();
        let new_credit_balance = credit.balance - request.amount;
        let settled = new_credit_balance.is_zero();
        let kind = if settled {
            PaymentKind::Settlement
        } else {
            PaymentKind::Installment
        };

        let payment = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            sale_id: Set(credit.sale_id),
            payment_method_id: Set(method.id),
            amount: Set(request.amount),
            balance_before: Set(sale.balance_due),
            balance_after: Set(sale.balance_due - request.amount),
            kind: Set(kind),
            notes: Set(request.notes.clone()),
            received_by: Set(received_by),
            created_at: Set(now),
        };
        let payment = payment
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let new_amount_paid = sale.amount_paid + request.amount;
        let new_balance_due = sale.balance_due - request.amount;
        let new_payment_status = if new_balance_due.is_zero() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        };

        let mut active_sale: sale::ActiveModel = sale.into();
        active_sale.amount_paid = Set(new_amount_paid);
        active_sale.balance_due = Set(new_balance_due);
        active_sale.payment_status = Set(new_payment_status.clone());
        active_sale.updated_at = Set(now);
        active_sale
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let repaid_so_far = credit.repaid;
        let customer_id = credit.customer_id;
        let credit_id = credit.id;

        let mut active_credit: credit::ActiveModel = credit.into();
        active_credit.repaid = Set(repaid_so_far + request.amount);
        active_credit.balance = Set(new_credit_balance);
        active_credit.status = Set(if settled {
            CreditStatus::Paid
        } else {
            CreditStatus::Active
        });
        active_credit.last_payment_at = Set(Some(now));
        active_credit.updated_at = Set(now);
        let credit = active_credit
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let summary = CustomerCreditSummary::find()
            .filter(customer_credit_summary::Column::CustomerId.eq(customer_id))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                error!(customer_id = %customer_id, "Customer has a credit but no summary row");
                ServiceError::InternalError(format!(
                    "Credit summary missing for customer {}",
                    customer_id
                ))
            })?;

        let total_repaid = summary.total_repaid;
        let total_outstanding = summary.total_outstanding;
        let active_credits = summary.active_credits;
        let paid_credits = summary.paid_credits;

        let mut active_summary: customer_credit_summary::ActiveModel = summary.into();
        active_summary.total_repaid = Set(total_repaid + request.amount);
        active_summary.total_outstanding = Set(total_outstanding - request.amount);
        if settled {
            active_summary.active_credits = Set(active_credits - 1);
            active_summary.paid_credits = Set(paid_credits + 1);
        }
        active_summary.last_payment_at = Set(Some(now));
        active_summary.updated_at = Set(now);
        active_summary
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, credit_id = %credit_id, "Failed to commit repayment");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            credit_id = %credit_id,
            sale_id = %sale_id,
            amount = %request.amount,
            settled = settled,
            "Recorded credit repayment"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::CreditRepaid {
                    credit_id,
                    sale_id,
                    amount: request.amount,
                    settled,
                })
                .await
            {
                warn!(error = %e, credit_id = %credit_id, "Failed to send credit repaid event");
            }
        }

        Ok(RepaymentResponse {
            payment,
            credit,
            sale_balance_due: new_balance_due,
            sale_payment_status: new_payment_status,
        })
    }

    /// Looks up the credit attached to a sale, if any.
    #[instrument(skip(self))]
    pub async fn get_credit_for_sale(
        &self,
        sale_id: Uuid,
    ) -> Result<Option<credit::Model>, ServiceError> {
        let db = &*self.db_pool;
        Credit::find()
            .filter(credit::Column::SaleId.eq(sale_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Lists credits, newest first, optionally narrowed by customer or
    /// status.
    #[instrument(skip(self, filter))]
    pub async fn list_credits(
        &self,
        filter: CreditListFilter,
        page: u64,
        per_page: u64,
    ) -> Result<CreditListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut query = Credit::find();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(credit::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(credit::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(credit::Column::OpenedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count credits");
            ServiceError::DatabaseError(e)
        })?;

        let credits = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, "Failed to fetch credits page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(CreditListResponse {
            credits,
            total,
            page,
            per_page,
        })
    }

    /// Returns the customer's running credit totals, if the customer has
    /// ever financed a sale.
    #[instrument(skip(self))]
    pub async fn get_customer_summary(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<customer_credit_summary::Model>, ServiceError> {
        let db = &*self.db_pool;
        CustomerCreditSummary::find()
            .filter(customer_credit_summary::Column::CustomerId.eq(customer_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
