//! Automated funding drawdown and claims engine.
//!
//! Everything in this crate is invoked as a short-lived operation against a
//! database connection: there is no in-process scheduler thread and no shared
//! mutable state between invocations. Each entry point re-reads whatever it
//! needs, so concurrent triggers are resolved by the database (unique indexes
//! plus the retry discipline in [`identifier`]), not by in-memory locks.

pub mod claims;
pub mod drawdown;
pub mod eligibility;
pub mod error;
pub mod identifier;
pub mod lifecycle;
pub mod notify;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{EngineError, Result};
