//! Shared transport-layer types for the drawdown and claims engine.
//! These structs cross the boundary between the engine crate and the
//! HTTP handlers, so they carry both `serde` and `utoipa` derives.

mod config;
mod filters;
mod summary;

pub use config::AutomationConfig;
pub use filters::ClaimFilters;
pub use summary::{DrawdownFailure, FrequencyBreakdown, RunOutcome, RunStatus, RunSummary};
