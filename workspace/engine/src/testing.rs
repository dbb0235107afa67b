//! Shared fixtures for engine tests: an in-memory SQLite database with the
//! full schema applied, plus a seeded resident and contract.

use chrono::{NaiveDate, NaiveDateTime};
use migration::{Migrator, MigratorTrait};
use model::entities::{billing_transaction, funding_contract, resident};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

pub struct Fixture {
    pub db: DatabaseConnection,
    pub resident: resident::Model,
    pub contract: funding_contract::Model,
}

impl Fixture {
    pub async fn new() -> Self {
        // A single pooled connection so every task sees the same in-memory
        // database.
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options)
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None).await.expect("Migrations failed");

        let resident = resident::ActiveModel {
            organization_id: Set(1),
            first_name: Set("Alex".to_string()),
            last_name: Set("Nguyen".to_string()),
            ndis_number: Set("430000001".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("Failed to seed resident");

        let contract = funding_contract::ActiveModel {
            organization_id: Set(1),
            resident_id: Set(resident.id),
            funding_source: Set(funding_contract::FundingSource::Ndia),
            original_amount: Set(Decimal::new(5000000, 2)), // 50000.00
            current_balance: Set(Decimal::new(5000000, 2)),
            drawdown_rate: Set(funding_contract::DrawdownRate::Daily),
            auto_drawdown: Set(true),
            daily_support_item_cost: Set(Decimal::new(10000, 2)), // 100.00
            last_drawdown_date: Set(None),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            end_date: Set(None),
            status: Set(funding_contract::ContractStatus::Active),
            parent_contract_id: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("Failed to seed contract");

        Self {
            db,
            resident,
            contract,
        }
    }

    /// Insert an additional contract for the seeded resident.
    pub async fn add_contract(
        &self,
        rate: funding_contract::DrawdownRate,
        balance: Decimal,
        daily_cost: Decimal,
        last_drawdown_date: Option<NaiveDate>,
    ) -> funding_contract::Model {
        funding_contract::ActiveModel {
            organization_id: Set(1),
            resident_id: Set(self.resident.id),
            funding_source: Set(funding_contract::FundingSource::Ndia),
            original_amount: Set(balance),
            current_balance: Set(balance),
            drawdown_rate: Set(rate),
            auto_drawdown: Set(true),
            daily_support_item_cost: Set(daily_cost),
            last_drawdown_date: Set(last_drawdown_date),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            end_date: Set(None),
            status: Set(funding_contract::ContractStatus::Active),
            parent_contract_id: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert contract")
    }

    /// Insert a draft transaction with an explicit number, against the
    /// seeded resident and contract.
    pub async fn insert_transaction(
        &self,
        number: &str,
        amount: Decimal,
    ) -> billing_transaction::Model {
        self.insert_transaction_on(number, amount, occurred_at()).await
    }

    pub async fn insert_transaction_on(
        &self,
        number: &str,
        amount: Decimal,
        occurred: NaiveDateTime,
    ) -> billing_transaction::Model {
        billing_transaction::ActiveModel {
            transaction_number: Set(number.to_string()),
            organization_id: Set(1),
            resident_id: Set(self.resident.id),
            contract_id: Set(self.contract.id),
            amount: Set(amount),
            occurred_at: Set(occurred),
            service_code: Set("SDA_DAILY".to_string()),
            status: Set(billing_transaction::TransactionStatus::Draft),
            claim_id: Set(None),
            source: Set(billing_transaction::TransactionSource::Manual),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert transaction")
    }
}

pub fn occurred_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(2, 0, 0)
        .unwrap()
}
