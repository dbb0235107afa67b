use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Enum for the claim lifecycle state. Transitions are validated against
/// the allow-list in the engine's lifecycle module; nothing else should
/// write this column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ClaimStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "processed")]
    Processed,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "partially_paid")]
    PartiallyPaid,
    #[sea_orm(string_value = "automation_submitted")]
    AutomationSubmitted,
    #[sea_orm(string_value = "auto_processed")]
    AutoProcessed,
}

/// A regulator-submission batch of billing transactions.
///
/// `transaction_count` and `total_amount` are denormalized from the linked
/// transactions and maintained by the explicit recalculation operation in
/// the engine's claims module, invoked at every mutation point.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "claims")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Externally unique claim reference (`CLM-A000123`).
    #[sea_orm(unique)]
    pub claim_number: String,
    pub organization_id: i32,
    pub created_by: String,
    /// The serialized `ClaimFilters` used to select transactions.
    pub filters_json: String,
    pub transaction_count: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amount: Decimal,
    pub status: ClaimStatus,
    pub submitted_at: Option<NaiveDateTime>,
    pub submitted_by: Option<String>,
    pub file_generated_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::billing_transaction::Entity")]
    BillingTransactions,
    #[sea_orm(has_many = "super::claim_reconciliation::Entity")]
    Reconciliations,
}

impl Related<super::billing_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingTransactions.def()
    }
}

impl Related<super::claim_reconciliation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
