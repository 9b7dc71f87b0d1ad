pub mod credits;
pub mod discounts;
pub mod inventory;
pub mod sales;
