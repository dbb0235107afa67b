use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create residents table
        manager
            .create_table(
                Table::create()
                    .table(Residents::Table)
                    .if_not_exists()
                    .col(pk_auto(Residents::Id))
                    .col(integer(Residents::OrganizationId))
                    .col(string(Residents::FirstName))
                    .col(string(Residents::LastName))
                    .col(string_uniq(Residents::NdisNumber))
                    .to_owned(),
            )
            .await?;

        // Create funding_contracts table
        manager
            .create_table(
                Table::create()
                    .table(FundingContracts::Table)
                    .if_not_exists()
                    .col(pk_auto(FundingContracts::Id))
                    .col(integer(FundingContracts::OrganizationId))
                    .col(integer(FundingContracts::ResidentId))
                    .col(string_len(FundingContracts::FundingSource, 16))
                    .col(decimal_len(FundingContracts::OriginalAmount, 16, 4))
                    .col(decimal_len(FundingContracts::CurrentBalance, 16, 4))
                    .col(string_len(FundingContracts::DrawdownRate, 16))
                    .col(boolean(FundingContracts::AutoDrawdown).default(false))
                    .col(decimal_len(FundingContracts::DailySupportItemCost, 16, 4))
                    .col(date_null(FundingContracts::LastDrawdownDate))
                    .col(date(FundingContracts::StartDate))
                    .col(date_null(FundingContracts::EndDate))
                    .col(string_len(FundingContracts::Status, 16))
                    .col(integer_null(FundingContracts::ParentContractId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_funding_contract_resident")
                            .from(FundingContracts::Table, FundingContracts::ResidentId)
                            .to(Residents::Table, Residents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_funding_contract_parent")
                            .from(FundingContracts::Table, FundingContracts::ParentContractId)
                            .to(FundingContracts::Table, FundingContracts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create claims table
        manager
            .create_table(
                Table::create()
                    .table(Claims::Table)
                    .if_not_exists()
                    .col(pk_auto(Claims::Id))
                    .col(string_uniq(Claims::ClaimNumber))
                    .col(integer(Claims::OrganizationId))
                    .col(string(Claims::CreatedBy))
                    .col(text(Claims::FiltersJson))
                    .col(integer(Claims::TransactionCount).default(0))
                    .col(decimal_len(Claims::TotalAmount, 16, 4))
                    .col(string_len(Claims::Status, 32))
                    .col(date_time_null(Claims::SubmittedAt))
                    .col(string_null(Claims::SubmittedBy))
                    .col(date_time_null(Claims::FileGeneratedAt))
                    .to_owned(),
            )
            .await?;

        // Create billing_transactions table
        manager
            .create_table(
                Table::create()
                    .table(BillingTransactions::Table)
                    .if_not_exists()
                    .col(pk_auto(BillingTransactions::Id))
                    .col(string_uniq(BillingTransactions::TransactionNumber))
                    .col(integer(BillingTransactions::OrganizationId))
                    .col(integer(BillingTransactions::ResidentId))
                    .col(integer(BillingTransactions::ContractId))
                    .col(decimal_len(BillingTransactions::Amount, 16, 4))
                    .col(date_time(BillingTransactions::OccurredAt))
                    .col(string(BillingTransactions::ServiceCode))
                    .col(string_len(BillingTransactions::Status, 16))
                    .col(integer_null(BillingTransactions::ClaimId))
                    .col(string_len(BillingTransactions::Source, 16))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_transaction_resident")
                            .from(BillingTransactions::Table, BillingTransactions::ResidentId)
                            .to(Residents::Table, Residents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_transaction_contract")
                            .from(BillingTransactions::Table, BillingTransactions::ContractId)
                            .to(FundingContracts::Table, FundingContracts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_transaction_claim")
                            .from(BillingTransactions::Table, BillingTransactions::ClaimId)
                            .to(Claims::Table, Claims::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create claim_reconciliations table
        manager
            .create_table(
                Table::create()
                    .table(ClaimReconciliations::Table)
                    .if_not_exists()
                    .col(pk_auto(ClaimReconciliations::Id))
                    .col(integer(ClaimReconciliations::ClaimId))
                    .col(string(ClaimReconciliations::UploadedBy))
                    .col(integer(ClaimReconciliations::ProcessedCount).default(0))
                    .col(integer(ClaimReconciliations::PaidCount).default(0))
                    .col(integer(ClaimReconciliations::RejectedCount).default(0))
                    .col(integer(ClaimReconciliations::ErrorCount).default(0))
                    .col(integer(ClaimReconciliations::UnmatchedCount).default(0))
                    .col(text_null(ClaimReconciliations::RawResults))
                    .col(date_time(ClaimReconciliations::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claim_reconciliation_claim")
                            .from(ClaimReconciliations::Table, ClaimReconciliations::ClaimId)
                            .to(Claims::Table, Claims::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create automation_runs table
        manager
            .create_table(
                Table::create()
                    .table(AutomationRuns::Table)
                    .if_not_exists()
                    .col(pk_auto(AutomationRuns::Id))
                    .col(integer(AutomationRuns::OrganizationId))
                    .col(date(AutomationRuns::RunDate))
                    .col(string_len(AutomationRuns::Status, 16))
                    .col(integer(AutomationRuns::ProcessedContracts).default(0))
                    .col(integer(AutomationRuns::SuccessfulTransactions).default(0))
                    .col(integer(AutomationRuns::FailedTransactions).default(0))
                    .col(decimal_len(AutomationRuns::TotalAmount, 16, 4))
                    .col(big_integer(AutomationRuns::ExecutionTimeMs).default(0))
                    .col(text_null(AutomationRuns::ErrorsJson))
                    .col(text(AutomationRuns::Summary))
                    .col(date_time(AutomationRuns::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // One run log entry per organization per day; this index backs the
        // run guard's idempotency check.
        manager
            .create_index(
                Index::create()
                    .name("idx_automation_runs_org_date")
                    .table(AutomationRuns::Table)
                    .col(AutomationRuns::OrganizationId)
                    .col(AutomationRuns::RunDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AutomationRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClaimReconciliations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillingTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Claims::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FundingContracts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Residents::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Residents {
    Table,
    Id,
    OrganizationId,
    FirstName,
    LastName,
    NdisNumber,
}

#[derive(DeriveIden)]
enum FundingContracts {
    Table,
    Id,
    OrganizationId,
    ResidentId,
    FundingSource,
    OriginalAmount,
    CurrentBalance,
    DrawdownRate,
    AutoDrawdown,
    DailySupportItemCost,
    LastDrawdownDate,
    StartDate,
    EndDate,
    Status,
    ParentContractId,
}

#[derive(DeriveIden)]
enum BillingTransactions {
    Table,
    Id,
    TransactionNumber,
    OrganizationId,
    ResidentId,
    ContractId,
    Amount,
    OccurredAt,
    ServiceCode,
    Status,
    ClaimId,
    Source,
}

#[derive(DeriveIden)]
enum Claims {
    Table,
    Id,
    ClaimNumber,
    OrganizationId,
    CreatedBy,
    FiltersJson,
    TransactionCount,
    TotalAmount,
    Status,
    SubmittedAt,
    SubmittedBy,
    FileGeneratedAt,
}

#[derive(DeriveIden)]
enum ClaimReconciliations {
    Table,
    Id,
    ClaimId,
    UploadedBy,
    ProcessedCount,
    PaidCount,
    RejectedCount,
    ErrorCount,
    UnmatchedCount,
    RawResults,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AutomationRuns {
    Table,
    Id,
    OrganizationId,
    RunDate,
    Status,
    ProcessedContracts,
    SuccessfulTransactions,
    FailedTransactions,
    TotalAmount,
    ExecutionTimeMs,
    ErrorsJson,
    Summary,
    CreatedAt,
}
