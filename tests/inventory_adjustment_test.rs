//! Integration tests for the inventory ledger outside the checkout path:
//! stock receipts, administrative adjustments and the movement history.

mod common;

use assert_matches::assert_matches;
use common::TestContext;
use rust_decimal_macros::dec;
use tienda_core::{
    errors::ServiceError,
    services::inventory::{AdjustStockRequest, ReceiveStockRequest},
};
use uuid::Uuid;

#[tokio::test]
async fn receiving_stock_raises_the_quantity_and_logs_cost() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("INV-10", 4, dec!(50_000), dec!(22_000))
        .await;
    let purchase_id = Uuid::new_v4();

    let movement = ctx
        .state
        .inventory_service
        .receive_stock(
            ReceiveStockRequest {
                variant_id: variant.id,
                quantity: 6,
                unit_cost: Some(dec!(21_000)),
                purchase_id: Some(purchase_id),
                notes: Some("container 2024-08".to_string()),
            },
            Uuid::new_v4(),
        )
        .await
        .expect("receipt should succeed");

    assert_eq!(movement.quantity, 6);
    assert_eq!(movement.stock_before, 4);
    assert_eq!(movement.stock_after, 10);
    assert_eq!(movement.unit_cost, dec!(21_000));
    assert_eq!(movement.total_value, dec!(126_000));
    assert_eq!(movement.purchase_id, Some(purchase_id));
    assert!(movement.sale_id.is_none());

    assert_eq!(ctx.reload_variant(variant.id).await.stock_quantity, 10);
}

#[tokio::test]
async fn receipt_without_cost_falls_back_to_the_variant_cost() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("INV-11", 0, dec!(50_000), dec!(22_000))
        .await;

    let movement = ctx
        .state
        .inventory_service
        .receive_stock(
            ReceiveStockRequest {
                variant_id: variant.id,
                quantity: 3,
                unit_cost: None,
                purchase_id: None,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await
        .expect("receipt should succeed");

    assert_eq!(movement.unit_cost, dec!(22_000));
    assert_eq!(movement.total_value, dec!(66_000));
}

#[tokio::test]
async fn receipt_quantity_must_be_positive() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("INV-12", 4, dec!(50_000), dec!(22_000))
        .await;

    let result = ctx
        .state
        .inventory_service
        .receive_stock(
            ReceiveStockRequest {
                variant_id: variant.id,
                quantity: 0,
                unit_cost: None,
                purchase_id: None,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
    assert_eq!(ctx.reload_variant(variant.id).await.stock_quantity, 4);
}

#[tokio::test]
async fn receipt_that_would_overflow_the_counter_is_rejected() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("INV-13", 5, dec!(50_000), dec!(22_000))
        .await;

    let result = ctx
        .state
        .inventory_service
        .receive_stock(
            ReceiveStockRequest {
                variant_id: variant.id,
                quantity: i32::MAX,
                unit_cost: None,
                purchase_id: None,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
    assert_eq!(ctx.reload_variant(variant.id).await.stock_quantity, 5);
}

#[tokio::test]
async fn adjustment_may_drive_stock_negative() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("INV-20", 2, dec!(50_000), dec!(22_000))
        .await;

    // A shrinkage count found more missing units than the system had.
    let movement = ctx
        .state
        .inventory_service
        .adjust_stock(
            AdjustStockRequest {
                variant_id: variant.id,
                quantity: -5,
                notes: Some("cycle count".to_string()),
            },
            Uuid::new_v4(),
        )
        .await
        .expect("adjustment should succeed");

    assert_eq!(movement.quantity, -5);
    assert_eq!(movement.stock_before, 2);
    assert_eq!(movement.stock_after, -3);
    assert_eq!(ctx.reload_variant(variant.id).await.stock_quantity, -3);
}

#[tokio::test]
async fn zero_adjustment_is_rejected() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("INV-21", 2, dec!(50_000), dec!(22_000))
        .await;

    let result = ctx
        .state
        .inventory_service
        .adjust_stock(
            AdjustStockRequest {
                variant_id: variant.id,
                quantity: 0,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn adjustment_at_the_integer_minimum_is_rejected() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("INV-22", 5, dec!(50_000), dec!(22_000))
        .await;

    // i32::MIN has no positive counterpart, so the ledger cannot book it.
    let result = ctx
        .state
        .inventory_service
        .adjust_stock(
            AdjustStockRequest {
                variant_id: variant.id,
                quantity: i32::MIN,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
    assert_eq!(ctx.reload_variant(variant.id).await.stock_quantity, 5);
}

#[tokio::test]
async fn unknown_variant_is_not_found() {
    let ctx = TestContext::new().await;

    let result = ctx
        .state
        .inventory_service
        .adjust_stock(
            AdjustStockRequest {
                variant_id: Uuid::new_v4(),
                quantity: 1,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn movement_history_pages_newest_first() {
    let ctx = TestContext::new().await;
    let variant = ctx
        .seed_variant("INV-30", 0, dec!(50_000), dec!(22_000))
        .await;
    let actor = Uuid::new_v4();

    for quantity in [5, 3, 2] {
        ctx.state
            .inventory_service
            .receive_stock(
                ReceiveStockRequest {
                    variant_id: variant.id,
                    quantity,
                    unit_cost: None,
                    purchase_id: None,
                    notes: None,
                },
                actor,
            )
            .await
            .expect("receipt should succeed");
    }

    let page = ctx
        .state
        .inventory_service
        .list_movements(variant.id, 1, 2)
        .await
        .expect("listing should succeed");

    assert_eq!(page.total, 3);
    assert_eq!(page.movements.len(), 2);
    assert_eq!(page.page, 1);

    let rest = ctx
        .state
        .inventory_service
        .list_movements(variant.id, 2, 2)
        .await
        .expect("listing should succeed");
    assert_eq!(rest.movements.len(), 1);

    // Page zero is clamped instead of underflowing.
    let clamped = ctx
        .state
        .inventory_service
        .list_movements(variant.id, 0, 2)
        .await
        .expect("listing should succeed");
    assert_eq!(clamped.page, 1);
    assert_eq!(clamped.movements.len(), 2);
}
