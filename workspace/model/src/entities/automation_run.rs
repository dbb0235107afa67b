use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Enum for the recorded outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AutomationRunStatus {
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// One record per execution of the scheduled drawdown job. Never mutated
/// after insertion. The unique (organization_id, run_date) index is the
/// run guard's idempotency check.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "automation_runs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    /// Calendar date of the run in the organization's timezone.
    pub run_date: NaiveDate,
    pub status: AutomationRunStatus,
    pub processed_contracts: i32,
    pub successful_transactions: i32,
    pub failed_transactions: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amount: Decimal,
    pub execution_time_ms: i64,
    /// Structured per-contract failures, as JSON text. Null when clean.
    pub errors_json: Option<String>,
    /// Human-readable narrative included in the emailed report.
    pub summary: String,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
