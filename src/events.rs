use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Domain events emitted after a transaction commits. Delivery is
/// best-effort; a failed send never fails the operation that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SaleCompleted {
        sale_id: Uuid,
        sale_number: String,
        customer_id: Uuid,
        total: Decimal,
    },
    CreditOpened {
        credit_id: Uuid,
        sale_id: Uuid,
        customer_id: Uuid,
        principal: Decimal,
        due_date: DateTime<Utc>,
    },
    CreditRepaid {
        credit_id: Uuid,
        sale_id: Uuid,
        amount: Decimal,
        settled: bool,
    },
    DiscountApplied {
        discount_id: Uuid,
        sale_id: Uuid,
        applied_value: Decimal,
    },
    DiscountExpired(Uuid),
    StockReceived {
        variant_id: Uuid,
        movement_id: Uuid,
        quantity: i32,
        stock_after: i32,
    },
    StockAdjusted {
        variant_id: Uuid,
        movement_id: Uuid,
        quantity: i32,
        stock_after: i32,
    },
}

/// Drains the event channel, logging each domain event as it arrives.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::SaleCompleted {
                sale_id,
                ref sale_number,
                total,
                ..
            } => {
                info!(
                    "Sale completed: {} ({}) total={}",
                    sale_number, sale_id, total
                );
            }
            Event::CreditOpened {
                credit_id,
                customer_id,
                principal,
                due_date,
                ..
            } => {
                info!(
                    "Credit opened: {} for customer {} principal={} due {}",
                    credit_id, customer_id, principal, due_date
                );
            }
            Event::CreditRepaid {
                credit_id,
                amount,
                settled,
                ..
            } => {
                if settled {
                    info!("Credit settled: {} with final payment {}", credit_id, amount);
                } else {
                    info!("Credit repayment: {} amount={}", credit_id, amount);
                }
            }
            Event::DiscountApplied {
                discount_id,
                sale_id,
                applied_value,
            } => {
                info!(
                    "Discount {} applied to sale {} for {}",
                    discount_id, sale_id, applied_value
                );
            }
            Event::DiscountExpired(discount_id) => {
                warn!("Discount expired during validation: {}", discount_id);
            }
            Event::StockReceived {
                variant_id,
                quantity,
                stock_after,
                ..
            } => {
                info!(
                    "Stock received: variant {} +{} units, now {}",
                    variant_id, quantity, stock_after
                );
            }
            Event::StockAdjusted {
                variant_id,
                quantity,
                stock_after,
                ..
            } => {
                info!(
                    "Stock adjusted: variant {} delta={} units, now {}",
                    variant_id, quantity, stock_after
                );
            }
        }
    }

    warn!("Event processing loop has ended");
}
