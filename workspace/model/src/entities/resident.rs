use sea_orm::entity::prelude::*;

/// A resident receiving SDA funding. Only the fields the engine needs to
/// reference are modeled here; the wider resident record lives outside
/// this subsystem.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "residents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Tenant scope supplied by the caller; never re-checked by the engine.
    pub organization_id: i32,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub ndis_number: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::funding_contract::Entity")]
    FundingContracts,
    #[sea_orm(has_many = "super::billing_transaction::Entity")]
    BillingTransactions,
}

impl Related<super::funding_contract::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FundingContracts.def()
    }
}

impl Related<super::billing_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
