pub mod businesses;
pub mod health;
pub mod reports;
