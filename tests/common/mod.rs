use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tienda_core::{
    config::{AppConfig, PoolTuning},
    db,
    entities::{
        movement_type,
        payment_method::{self, PaymentCategory},
        product_variant,
    },
    events::{self, EventSender},
    services::sales::{CreateSaleRequest, SaleLineInput, SalePaymentInput},
    AppState,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Test harness backed by a throwaway SQLite database with the full schema
/// and the seeded reference rows in place.
pub struct TestContext {
    pub state: AppState,
    db_file: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestContext {
    /// Construct a fresh database, run migrations and seed the lookup
    /// tables every service depends on.
    pub async fn new() -> Self {
        let db_file = format!("tienda_test_{}.db", Uuid::new_v4().simple());
        let _ = std::fs::remove_file(&db_file);

        let cfg = AppConfig {
            database_url: format!("sqlite://{db_file}?mode=rwc"),
            environment: "test".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            auto_migrate: true,
            pool: PoolTuning {
                max_connections: 1,
                min_connections: 1,
                connect_timeout_secs: 5,
                idle_timeout_secs: 60,
                acquire_timeout_secs: 5,
            },
            credit_term_days: 30,
            subtotal_tolerance: 0.01,
            event_channel_capacity: 256,
        };

        let pool = db::connect_from_config(&cfg)
            .await
            .expect("failed to create test database");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(cfg, db_arc, Some(event_sender))
            .expect("failed to build app state for tests");

        let ctx = Self {
            state,
            db_file,
            _event_task: event_task,
        };
        ctx.seed_reference_data().await;
        ctx
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    async fn seed_reference_data(&self) {
        let now = Utc::now();

        for (code, name) in [
            ("customer_sale", "Customer sale"),
            ("purchase", "Purchase receipt"),
            ("customer_return", "Customer return"),
            ("adjustment", "Manual adjustment"),
        ] {
            movement_type::ActiveModel {
                id: Set(Uuid::new_v4()),
                code: Set(code.to_string()),
                name: Set(name.to_string()),
                created_at: Set(now),
            }
            .insert(self.db())
            .await
            .expect("seed movement type");
        }

        for (code, name, category) in [
            ("cash", "Cash", PaymentCategory::Cash),
            ("card", "Card", PaymentCategory::Card),
            ("transfer", "Bank transfer", PaymentCategory::Transfer),
            ("store_credit", "Store credit", PaymentCategory::StoreCredit),
        ] {
            payment_method::ActiveModel {
                id: Set(Uuid::new_v4()),
                code: Set(code.to_string()),
                name: Set(name.to_string()),
                category: Set(category),
                is_active: Set(true),
                created_at: Set(now),
            }
            .insert(self.db())
            .await
            .expect("seed payment method");
        }
    }

    /// Id of one of the seeded payment methods, by code.
    pub async fn payment_method_id(&self, code: &str) -> Uuid {
        payment_method::Entity::find()
            .filter(payment_method::Column::Code.eq(code))
            .one(self.db())
            .await
            .expect("query payment method")
            .expect("payment method seeded")
            .id
    }

    pub async fn seed_variant(
        &self,
        sku: &str,
        stock: i32,
        sale_price: Decimal,
        cost: Decimal,
    ) -> product_variant::Model {
        let now = Utc::now();
        product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(Uuid::new_v4()),
            sku: Set(sku.to_string()),
            name: Set(format!("Variant {}", sku)),
            sale_price: Set(sale_price),
            cost: Set(cost),
            stock_quantity: Set(stock),
            min_stock: Set(0),
            max_stock: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db())
        .await
        .expect("seed product variant")
    }

    #[allow(dead_code)]
    pub async fn reload_variant(&self, id: Uuid) -> product_variant::Model {
        product_variant::Entity::find_by_id(id)
            .one(self.db())
            .await
            .expect("query product variant")
            .expect("product variant exists")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self._event_task.abort();
        let _ = std::fs::remove_file(&self.db_file);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_file));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_file));
    }
}

pub fn line(variant_id: Uuid, quantity: i32, unit_price: Decimal) -> SaleLineInput {
    SaleLineInput {
        variant_id,
        quantity,
        unit_price,
        line_discount: None,
    }
}

pub fn pay(payment_method_id: Uuid, amount: Decimal) -> SalePaymentInput {
    SalePaymentInput {
        payment_method_id,
        amount,
        notes: None,
    }
}

pub fn sale_request(
    customer_id: Uuid,
    lines: Vec<SaleLineInput>,
    payments: Vec<SalePaymentInput>,
) -> CreateSaleRequest {
    CreateSaleRequest {
        customer_id: Some(customer_id),
        seller_id: Uuid::new_v4(),
        lines,
        payments,
        subtotal: None,
        discount_total: None,
        tax: None,
        discount_code: None,
        notes: None,
    }
}
