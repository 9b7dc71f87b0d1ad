//! Integration tests for the store-credit lifecycle.
//!
//! A sale tendered (fully or partly) with the store-credit method opens a
//! credit at checkout. These tests walk the ledger from opening through
//! installments to settlement, and pin down the repayment guard rails.

mod common;

use assert_matches::assert_matches;
use common::{line, pay, sale_request, TestContext};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use tienda_core::{
    entities::{
        credit::CreditStatus,
        payment::{self, PaymentKind},
        sale::{self, PaymentStatus},
    },
    errors::ServiceError,
    services::{
        credits::{CreditListFilter, RepayCreditRequest},
        sales::SaleReceipt,
    },
};
use uuid::Uuid;

#[tokio::test]
async fn store_credit_checkout_opens_a_credit() {
    let ctx = TestContext::new().await;
    let customer_id = Uuid::new_v4();

    let receipt = checkout_on_credit(&ctx, "CR-10", customer_id, dec!(100_000)).await;

    assert_eq!(receipt.sale.amount_paid, dec!(0));
    assert_eq!(receipt.sale.balance_due, dec!(100_000));
    assert_eq!(receipt.sale.payment_status, PaymentStatus::Pending);

    // The tender itself is still on the payment trail.
    assert_eq!(receipt.payments.len(), 1);
    assert_eq!(receipt.payments[0].amount, dec!(100_000));
    assert_eq!(receipt.payments[0].kind, PaymentKind::Initial);

    let credit = receipt.credit.expect("credit should be opened");
    assert_eq!(credit.customer_id, customer_id);
    assert_eq!(credit.principal, dec!(100_000));
    assert_eq!(credit.repaid, dec!(0));
    assert_eq!(credit.balance, dec!(100_000));
    assert_eq!(credit.status, CreditStatus::Active);
    assert!(credit.last_payment_at.is_none());
    assert_eq!((credit.due_date - credit.opened_at).num_days(), 30);

    let summary = ctx
        .state
        .credit_service
        .get_customer_summary(customer_id)
        .await
        .expect("summary lookup should succeed")
        .expect("summary should exist");
    assert_eq!(summary.total_extended, dec!(100_000));
    assert_eq!(summary.total_outstanding, dec!(100_000));
    assert_eq!(summary.total_repaid, dec!(0));
    assert_eq!(summary.active_credits, 1);
    assert_eq!(summary.paid_credits, 0);
    assert!(summary.last_credit_at.is_some());
}

#[tokio::test]
async fn mixed_tender_splits_settled_and_financed() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("CR-20", 5, dec!(100_000), dec!(55_000))
        .await;
    let cash = ctx.payment_method_id("cash").await;
    let store_credit = ctx.payment_method_id("store_credit").await;
    let customer_id = Uuid::new_v4();

    let request = sale_request(
        customer_id,
        vec![line(variant.id, 1, dec!(100_000))],
        vec![pay(cash, dec!(40_000)), pay(store_credit, dec!(60_000))],
    );

    let receipt = ctx
        .state
        .sale_service
        .create_sale(request, Uuid::new_v4())
        .await
        .expect("mixed-tender checkout should succeed");

    // Only the cash portion counts as settled; the rest becomes a credit.
    assert_eq!(receipt.sale.amount_paid, dec!(40_000));
    assert_eq!(receipt.sale.balance_due, dec!(60_000));
    assert_eq!(receipt.sale.payment_status, PaymentStatus::Partial);

    let credit = receipt.credit.expect("credit should be opened");
    assert_eq!(credit.principal, dec!(60_000));
    assert_eq!(credit.balance, dec!(60_000));
}

#[tokio::test]
async fn settling_repayment_closes_credit_and_sale() {
    let ctx = TestContext::new().await;
    let customer_id = Uuid::new_v4();
    let receipt = checkout_on_credit(&ctx, "CR-30", customer_id, dec!(100_000)).await;
    let cash = ctx.payment_method_id("cash").await;

    let response = ctx
        .state
        .credit_service
        .repay(
            receipt.sale.id,
            repay_request(cash, dec!(100_000)),
            Uuid::new_v4(),
        )
        .await
        .expect("settlement should succeed");

    assert_eq!(response.payment.kind, PaymentKind::Settlement);
    assert_eq!(response.payment.balance_before, dec!(100_000));
    assert_eq!(response.payment.balance_after, dec!(0));

    assert_eq!(response.credit.status, CreditStatus::Paid);
    assert_eq!(response.credit.repaid, dec!(100_000));
    assert_eq!(response.credit.balance, dec!(0));
    assert!(response.credit.last_payment_at.is_some());

    assert_eq!(response.sale_balance_due, dec!(0));
    assert_eq!(response.sale_payment_status, PaymentStatus::Paid);

    let sale = sale::Entity::find_by_id(receipt.sale.id)
        .one(ctx.db())
        .await
        .expect("query sale")
        .expect("sale should exist");
    assert_eq!(sale.amount_paid, dec!(100_000));
    assert_eq!(sale.balance_due, dec!(0));
    assert_eq!(sale.payment_status, PaymentStatus::Paid);

    let summary = ctx
        .state
        .credit_service
        .get_customer_summary(customer_id)
        .await
        .expect("summary lookup should succeed")
        .expect("summary should exist");
    assert_eq!(summary.total_outstanding, dec!(0));
    assert_eq!(summary.total_repaid, dec!(100_000));
    assert_eq!(summary.active_credits, 0);
    assert_eq!(summary.paid_credits, 1);
    assert!(summary.last_payment_at.is_some());
}

#[tokio::test]
async fn installment_reduces_balance_without_closing() {
    let ctx = TestContext::new().await;
    let customer_id = Uuid::new_v4();
    let receipt = checkout_on_credit(&ctx, "CR-40", customer_id, dec!(100_000)).await;
    let cash = ctx.payment_method_id("cash").await;

    let response = ctx
        .state
        .credit_service
        .repay(
            receipt.sale.id,
            repay_request(cash, dec!(40_000)),
            Uuid::new_v4(),
        )
        .await
        .expect("installment should succeed");

    assert_eq!(response.payment.kind, PaymentKind::Installment);
    assert_eq!(response.payment.balance_before, dec!(100_000));
    assert_eq!(response.payment.balance_after, dec!(60_000));

    assert_eq!(response.credit.status, CreditStatus::Active);
    assert_eq!(response.credit.repaid, dec!(40_000));
    assert_eq!(response.credit.balance, dec!(60_000));

    assert_eq!(response.sale_balance_due, dec!(60_000));
    assert_eq!(response.sale_payment_status, PaymentStatus::Partial);

    let summary = ctx
        .state
        .credit_service
        .get_customer_summary(customer_id)
        .await
        .expect("summary lookup should succeed")
        .expect("summary should exist");
    assert_eq!(summary.total_outstanding, dec!(60_000));
    assert_eq!(summary.total_repaid, dec!(40_000));
    assert_eq!(summary.active_credits, 1);
}

#[tokio::test]
async fn overpayment_is_rejected_and_changes_nothing() {
    let ctx = TestContext::new().await;
    let receipt = checkout_on_credit(&ctx, "CR-50", Uuid::new_v4(), dec!(100_000)).await;
    let cash = ctx.payment_method_id("cash").await;

    let result = ctx
        .state
        .credit_service
        .repay(
            receipt.sale.id,
            repay_request(cash, dec!(150_000)),
            Uuid::new_v4(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::Overpayment(_)));

    let credit = ctx
        .state
        .credit_service
        .get_credit_for_sale(receipt.sale.id)
        .await
        .expect("credit lookup should succeed")
        .expect("credit should exist");
    assert_eq!(credit.balance, dec!(100_000));
    assert_eq!(credit.status, CreditStatus::Active);

    // Only the checkout tender is on file.
    let payments = payment::Entity::find()
        .count(ctx.db())
        .await
        .expect("count payments");
    assert_eq!(payments, 1);
}

#[tokio::test]
async fn repaying_a_settled_credit_is_rejected() {
    let ctx = TestContext::new().await;
    let receipt = checkout_on_credit(&ctx, "CR-60", Uuid::new_v4(), dec!(50_000)).await;
    let cash = ctx.payment_method_id("cash").await;

    ctx.state
        .credit_service
        .repay(
            receipt.sale.id,
            repay_request(cash, dec!(50_000)),
            Uuid::new_v4(),
        )
        .await
        .expect("settlement should succeed");

    let result = ctx
        .state
        .credit_service
        .repay(
            receipt.sale.id,
            repay_request(cash, dec!(1_000)),
            Uuid::new_v4(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::AlreadyPaid(_)));
}

#[tokio::test]
async fn repay_without_credit_is_not_found() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("CR-70", 5, dec!(30_000), dec!(12_000))
        .await;
    let cash = ctx.payment_method_id("cash").await;

    let request = sale_request(
        Uuid::new_v4(),
        vec![line(variant.id, 1, dec!(30_000))],
        vec![pay(cash, dec!(30_000))],
    );
    let receipt = ctx
        .state
        .sale_service
        .create_sale(request, Uuid::new_v4())
        .await
        .expect("cash checkout should succeed");
    assert!(receipt.credit.is_none());

    let result = ctx
        .state
        .credit_service
        .repay(
            receipt.sale.id,
            repay_request(cash, dec!(10_000)),
            Uuid::new_v4(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn non_positive_repayment_is_rejected() {
    let ctx = TestContext::new().await;
    let receipt = checkout_on_credit(&ctx, "CR-80", Uuid::new_v4(), dec!(20_000)).await;
    let cash = ctx.payment_method_id("cash").await;

    let zero = ctx
        .state
        .credit_service
        .repay(receipt.sale.id, repay_request(cash, dec!(0)), Uuid::new_v4())
        .await;
    assert_matches!(zero, Err(ServiceError::ValidationError(_)));

    let negative = ctx
        .state
        .credit_service
        .repay(
            receipt.sale.id,
            repay_request(cash, dec!(-5_000)),
            Uuid::new_v4(),
        )
        .await;
    assert_matches!(negative, Err(ServiceError::ValidationError(_)));

    // Neither attempt reached the ledger.
    let credit = ctx
        .state
        .credit_service
        .get_credit_for_sale(receipt.sale.id)
        .await
        .expect("credit lookup should succeed")
        .expect("credit should exist");
    assert_eq!(credit.balance, dec!(20_000));
    assert_eq!(credit.repaid, dec!(0));
}

#[tokio::test]
async fn listing_and_summary_track_the_ledger() {
    let ctx = TestContext::new().await;
    let customer_id = Uuid::new_v4();
    let first = checkout_on_credit(&ctx, "CR-90", customer_id, dec!(100_000)).await;
    checkout_on_credit(&ctx, "CR-91", customer_id, dec!(60_000)).await;
    let cash = ctx.payment_method_id("cash").await;

    ctx.state
        .credit_service
        .repay(
            first.sale.id,
            repay_request(cash, dec!(100_000)),
            Uuid::new_v4(),
        )
        .await
        .expect("settlement should succeed");

    let all = ctx
        .state
        .credit_service
        .list_credits(
            CreditListFilter {
                customer_id: Some(customer_id),
                status: None,
            },
            1,
            20,
        )
        .await
        .expect("listing should succeed");
    assert_eq!(all.total, 2);
    assert_eq!(all.credits.len(), 2);

    let active = ctx
        .state
        .credit_service
        .list_credits(
            CreditListFilter {
                customer_id: Some(customer_id),
                status: Some(CreditStatus::Active),
            },
            1,
            20,
        )
        .await
        .expect("listing should succeed");
    assert_eq!(active.total, 1);
    assert_eq!(active.credits[0].principal, dec!(60_000));

    let summary = ctx
        .state
        .credit_service
        .get_customer_summary(customer_id)
        .await
        .expect("summary lookup should succeed")
        .expect("summary should exist");
    assert_eq!(summary.total_extended, dec!(160_000));
    assert_eq!(summary.total_outstanding, dec!(60_000));
    assert_eq!(summary.total_repaid, dec!(100_000));
    assert_eq!(summary.active_credits, 1);
    assert_eq!(summary.paid_credits, 1);

    let stranger = ctx
        .state
        .credit_service
        .get_customer_summary(Uuid::new_v4())
        .await
        .expect("summary lookup should succeed");
    assert!(stranger.is_none());
}

/// Seeds a variant and checks out one unit fully financed on store credit.
async fn checkout_on_credit(
    ctx: &TestContext,
    sku: &str,
    customer_id: Uuid,
    amount: Decimal,
) -> SaleReceipt {
    let variant = ctx.seed_variant(sku, 10, amount, dec!(1_000)).await;
    let store_credit = ctx.payment_method_id("store_credit").await;
    let request = sale_request(
        customer_id,
        vec![line(variant.id, 1, amount)],
        vec![pay(store_credit, amount)],
    );
    ctx.state
        .sale_service
        .create_sale(request, Uuid::new_v4())
        .await
        .expect("financed checkout should succeed")
}

fn repay_request(payment_method_id: Uuid, amount: Decimal) -> RepayCreditRequest {
    RepayCreditRequest {
        amount,
        payment_method_id,
        notes: None,
    }
}
