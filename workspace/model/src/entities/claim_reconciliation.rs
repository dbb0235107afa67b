use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

use super::claim;

/// One processed regulator response file for a claim. Append-only; the
/// resulting claim status change, if any, is decided by the caller and
/// applied through the validated transition path.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "claim_reconciliations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub claim_id: i32,
    pub uploaded_by: String,
    pub processed_count: i32,
    pub paid_count: i32,
    pub rejected_count: i32,
    pub error_count: i32,
    pub unmatched_count: i32,
    /// Raw per-line results from the regulator file, as JSON text.
    pub raw_results: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "claim::Entity",
        from = "Column::ClaimId",
        to = "claim::Column::Id",
        on_delete = "Cascade"
    )]
    Claim,
}

impl Related<claim::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Claim.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
