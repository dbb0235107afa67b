pub mod automation;
pub mod claims;
pub mod contracts;
pub mod health;
pub mod residents;
pub mod transactions;
