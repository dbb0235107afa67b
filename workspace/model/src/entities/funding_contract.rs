use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::resident;

/// Enum for the origin of the funding allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum FundingSource {
    #[sea_orm(string_value = "Ndia")]
    Ndia,
    #[sea_orm(string_value = "PlanManaged")]
    PlanManaged,
    #[sea_orm(string_value = "SelfManaged")]
    SelfManaged,
}

/// Enum for the drawdown cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DrawdownRate {
    #[sea_orm(string_value = "Daily")]
    Daily,
    #[sea_orm(string_value = "Weekly")]
    Weekly,
    #[sea_orm(string_value = "Monthly")]
    Monthly,
}

/// Enum for the contract lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ContractStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Expired")]
    Expired,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "Renewed")]
    Renewed,
}

/// A time-bounded funding allocation for one resident. The drawdown
/// generator is the only writer of `current_balance` and
/// `last_drawdown_date`; both updates are guarded so the balance never
/// goes negative.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "funding_contracts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub resident_id: i32,
    pub funding_source: FundingSource,
    /// Total allocated amount. Invariant: 0 <= current_balance <= original_amount.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub original_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub current_balance: Decimal,
    pub drawdown_rate: DrawdownRate,
    /// Whether the scheduled drawdown job may touch this contract at all.
    pub auto_drawdown: bool,
    /// Per-day cost of the funded support item; the drawdown amount is
    /// derived from this and the cadence.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub daily_support_item_cost: Decimal,
    /// Date of the most recent successful drawdown, in the organization's
    /// timezone. Null until the first drawdown.
    pub last_drawdown_date: Option<NaiveDate>,
    pub start_date: NaiveDate,
    /// If null, the contract runs until exhausted or cancelled.
    pub end_date: Option<NaiveDate>,
    pub status: ContractStatus,
    /// Links a renewed contract back to its predecessor.
    pub parent_contract_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "resident::Entity",
        from = "Column::ResidentId",
        to = "resident::Column::Id",
        on_delete = "Cascade"
    )]
    Resident,
    #[sea_orm(has_many = "super::billing_transaction::Entity")]
    BillingTransactions,
}

impl Related<resident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resident.def()
    }
}

impl Related<super::billing_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
