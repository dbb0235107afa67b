//! This file serves as the root for all SeaORM entity modules.
//! The data model for the SDA provider platform's drawdown and claims
//! engine lives here: funding contracts, billing transactions, claims,
//! reconciliation records, and the automation run log.

pub mod automation_run;
pub mod billing_transaction;
pub mod claim;
pub mod claim_reconciliation;
pub mod funding_contract;
pub mod resident;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::automation_run::Entity as AutomationRun;
    pub use super::billing_transaction::Entity as BillingTransaction;
    pub use super::claim::Entity as Claim;
    pub use super::claim_reconciliation::Entity as ClaimReconciliation;
    pub use super::funding_contract::Entity as FundingContract;
    pub use super::resident::Entity as Resident;
}
