pub mod credit;
pub mod customer_credit_summary;
pub mod discount;
pub mod discount_history;
pub mod discount_usage;
pub mod inventory_movement;
pub mod movement_type;
pub mod payment;
pub mod payment_method;
pub mod product_variant;
pub mod sale;
pub mod sale_line;
