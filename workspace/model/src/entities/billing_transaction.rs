use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{claim, funding_contract, resident};

/// Enum for the billing transaction lifecycle state. A transaction is
/// immutable once it reaches Paid or Rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "picked_up")]
    PickedUp,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Enum for how the transaction came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionSource {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "auto_drawdown")]
    AutoDrawdown,
}

/// A single billing event against a contract and resident.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "billing_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Human-readable sequential identifier (`TXN-A000123`), allocated by
    /// the identifier allocator. The unique index here is what surfaces
    /// allocation races as retryable errors.
    #[sea_orm(unique)]
    pub transaction_number: String,
    pub organization_id: i32,
    pub resident_id: i32,
    pub contract_id: i32,
    /// Always positive; the sign convention is "amount drawn".
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub occurred_at: NaiveDateTime,
    pub service_code: String,
    pub status: TransactionStatus,
    /// Set exactly once, when the claim packager picks this row up.
    pub claim_id: Option<i32>,
    pub source: TransactionSource,
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
    #[sea_orm(
        belongs_to = "funding_contract::Entity",
        from = "Column::ContractId",
        to = "funding_contract::Column::Id",
        on_delete = "Cascade"
    )]
    Contract,
    #[sea_orm(
        belongs_to = "claim::Entity",
        from = "Column::ClaimId",
        to = "claim::Column::Id",
        on_delete = "SetNull"
    )]
    Claim,
}

impl Related<resident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resident.def()
    }
}

impl Related<funding_contract::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contract.def()
    }
}

impl Related<claim::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Claim.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
