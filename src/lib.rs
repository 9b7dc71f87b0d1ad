//! Tienda Core Library
//!
//! This crate provides the transactional core of the store: inventory
//! movements, checkout, discounts and customer credit.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::{
    credits::CreditService, discounts::DiscountService, inventory::InventoryService,
    sales::SaleService,
};

/// Shared state handed to the HTTP layer: the pool, the effective
/// configuration and one instance of every domain service.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Option<Arc<events::EventSender>>,
    pub inventory_service: Arc<InventoryService>,
    pub discount_service: Arc<DiscountService>,
    pub credit_service: Arc<CreditService>,
    pub sale_service: Arc<SaleService>,
}

impl AppState {
    /// Wires every service against one pool and one event channel. Fails
    /// when a configured number cannot be represented as an exact decimal.
    pub fn new(
        config: config::AppConfig,
        db: Arc<DatabaseConnection>,
        event_sender: Option<Arc<events::EventSender>>,
    ) -> Result<Self, errors::ServiceError> {
        let subtotal_tolerance = Decimal::try_from(config.subtotal_tolerance).map_err(|e| {
            errors::ServiceError::Configuration(format!(
                "subtotal_tolerance {} is not a valid decimal: {}",
                config.subtotal_tolerance, e
            ))
        })?;

        let inventory_service = Arc::new(InventoryService::new(db.clone(), event_sender.clone()));
        let discount_service = Arc::new(DiscountService::new(db.clone(), event_sender.clone()));
        let credit_service = Arc::new(CreditService::new(
            db.clone(),
            event_sender.clone(),
            config.credit_term_days,
        ));
        let sale_service = Arc::new(SaleService::new(
            db.clone(),
            event_sender.clone(),
            inventory_service.clone(),
            discount_service.clone(),
            credit_service.clone(),
            subtotal_tolerance,
        ));

        Ok(Self {
            db,
            config,
            event_sender,
            inventory_service,
            discount_service,
            credit_service,
            sale_service,
        })
    }
}

pub mod prelude {
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::services::credits::*;
    pub use crate::services::discounts::*;
    pub use crate::services::inventory::*;
    pub use crate::services::sales::*;
    pub use crate::AppState;
}
