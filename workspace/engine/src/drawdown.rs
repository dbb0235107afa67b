//! Drawdown transaction generation.
//!
//! Given the eligible-contract set, creates one billing transaction per
//! contract and decrements that contract's balance. Contracts are processed
//! sequentially and independently: one failure is captured as a structured
//! error entry and the loop moves on, so summaries are deterministic in
//! contract-selection order and a partial batch is reported as such.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use common::{DrawdownFailure, RunSummary};
use model::entities::{
    billing_transaction::{self, TransactionSource, TransactionStatus},
    funding_contract::{self, DrawdownRate},
};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::identifier::{self, TRANSACTION_PREFIX};

fn days_in_month(date: NaiveDate) -> i64 {
    let first = date.with_day(1).expect("day 1 always exists");
    let next = first + Months::new(1);
    (next - first).num_days()
}

/// The amount one drawdown covers: the daily support item cost scaled to
/// the contract's cadence. Monthly drawdowns cover the calendar month of
/// the run date. Fixed-precision decimal arithmetic throughout.
pub fn drawdown_amount(contract: &funding_contract::Model, today: NaiveDate) -> Decimal {
    let cost = contract.daily_support_item_cost;
    match contract.drawdown_rate {
        DrawdownRate::Daily => cost,
        DrawdownRate::Weekly => cost * Decimal::from(7),
        DrawdownRate::Monthly => cost * Decimal::from(days_in_month(today)),
    }
}

fn service_code(rate: DrawdownRate) -> &'static str {
    match rate {
        DrawdownRate::Daily => "SDA_DAILY",
        DrawdownRate::Weekly => "SDA_WEEKLY",
        DrawdownRate::Monthly => "SDA_MONTHLY",
    }
}

/// Draw down a single contract: allocate an identifier, insert the
/// transaction, then apply a guarded balance decrement. The decrement only
/// succeeds while `current_balance >= amount` still holds in the database,
/// so a concurrent edit (or a stale balance read) can never push the
/// balance negative; in that case the just-inserted transaction is removed
/// again as a compensating action.
async fn draw_one<C: ConnectionTrait>(
    db: &C,
    contract: &funding_contract::Model,
    today: NaiveDate,
    occurred_at: NaiveDateTime,
) -> Result<Decimal> {
    let amount = drawdown_amount(contract, today);
    if contract.current_balance < amount {
        return Err(EngineError::InsufficientBalance {
            contract_id: contract.id,
            balance: contract.current_balance,
            amount,
        });
    }

    let transaction = identifier::with_allocation_retry(TRANSACTION_PREFIX, move || async move {
        let number = identifier::next_transaction_number(db).await?;
        let inserted = billing_transaction::ActiveModel {
            transaction_number: Set(number),
            organization_id: Set(contract.organization_id),
            resident_id: Set(contract.resident_id),
            contract_id: Set(contract.id),
            amount: Set(amount),
            occurred_at: Set(occurred_at),
            service_code: Set(service_code(contract.drawdown_rate).to_string()),
            status: Set(TransactionStatus::Draft),
            claim_id: Set(None),
            source: Set(TransactionSource::AutoDrawdown),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(inserted)
    })
    .await?;

    let updated = funding_contract::Entity::update_many()
        .col_expr(
            funding_contract::Column::CurrentBalance,
            Expr::col(funding_contract::Column::CurrentBalance).sub(Expr::value(amount)),
        )
        .col_expr(
            funding_contract::Column::LastDrawdownDate,
            Expr::value(today),
        )
        .filter(funding_contract::Column::Id.eq(contract.id))
        .filter(funding_contract::Column::CurrentBalance.gte(amount))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        // Lost to a concurrent balance edit; take the transaction back out.
        warn!(
            contract_id = contract.id,
            transaction = %transaction.transaction_number,
            "guarded balance decrement matched no rows, removing transaction"
        );
        billing_transaction::Entity::delete_by_id(transaction.id)
            .exec(db)
            .await?;
        let current = funding_contract::Entity::find_by_id(contract.id)
            .one(db)
            .await?
            .ok_or(EngineError::ContractNotFound(contract.id))?;
        return Err(EngineError::InsufficientBalance {
            contract_id: contract.id,
            balance: current.current_balance,
            amount,
        });
    }

    info!(
        contract_id = contract.id,
        transaction = %transaction.transaction_number,
        %amount,
        "drawdown transaction generated"
    );
    Ok(amount)
}

/// Process every eligible contract sequentially and return the run summary.
/// Never aborts early: per-contract failures become structured error
/// entries and the remaining contracts are still processed.
pub async fn run_drawdowns<C: ConnectionTrait>(
    db: &C,
    contracts: &[funding_contract::Model],
    today: NaiveDate,
    occurred_at: NaiveDateTime,
) -> RunSummary {
    let mut summary = RunSummary {
        processed_contracts: contracts.len() as u32,
        ..Default::default()
    };

    for contract in contracts {
        match draw_one(db, contract, today, occurred_at).await {
            Ok(amount) => {
                summary.successful_transactions += 1;
                summary.total_amount += amount;
                match contract.drawdown_rate {
                    DrawdownRate::Daily => summary.frequency.daily += 1,
                    DrawdownRate::Weekly => summary.frequency.weekly += 1,
                    DrawdownRate::Monthly => summary.frequency.monthly += 1,
                }
            }
            Err(err) => {
                warn!(contract_id = contract.id, error = %err, "drawdown failed for contract");
                summary.failed_transactions += 1;
                summary.errors.push(DrawdownFailure {
                    contract_id: contract.id,
                    message: err.to_string(),
                });
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use common::RunStatus;
    use sea_orm::{ActiveModelTrait, IntoActiveModel};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at_midnight(d: NaiveDate) -> NaiveDateTime {
        d.and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn amount_scales_with_cadence() {
        let fixture_contract = |rate| funding_contract::Model {
            id: 1,
            organization_id: 1,
            resident_id: 1,
            funding_source: funding_contract::FundingSource::Ndia,
            original_amount: Decimal::new(5000000, 2),
            current_balance: Decimal::new(5000000, 2),
            drawdown_rate: rate,
            auto_drawdown: true,
            daily_support_item_cost: Decimal::new(10000, 2), // 100.00
            last_drawdown_date: None,
            start_date: date(2024, 1, 1),
            end_date: None,
            status: funding_contract::ContractStatus::Active,
            parent_contract_id: None,
        };
        let feb_leap = date(2024, 2, 10);
        assert_eq!(
            drawdown_amount(&fixture_contract(DrawdownRate::Daily), feb_leap),
            Decimal::new(10000, 2)
        );
        assert_eq!(
            drawdown_amount(&fixture_contract(DrawdownRate::Weekly), feb_leap),
            Decimal::new(70000, 2)
        );
        assert_eq!(
            drawdown_amount(&fixture_contract(DrawdownRate::Monthly), feb_leap),
            Decimal::new(290000, 2) // 29 days in Feb 2024
        );
    }

    #[tokio::test]
    async fn successful_run_updates_balance_and_last_drawdown_date() {
        let fixture = testing::Fixture::new().await;
        let today = date(2024, 1, 2);

        let summary = run_drawdowns(
            &fixture.db,
            std::slice::from_ref(&fixture.contract),
            today,
            at_midnight(today),
        )
        .await;

        assert_eq!(summary.status(), RunStatus::Success);
        assert_eq!(summary.successful_transactions, 1);
        assert_eq!(summary.total_amount, Decimal::new(10000, 2));
        assert_eq!(summary.frequency.daily, 1);

        let contract = funding_contract::Entity::find_by_id(fixture.contract.id)
            .one(&fixture.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contract.current_balance, Decimal::new(4990000, 2));
        assert_eq!(contract.last_drawdown_date, Some(today));
        assert!(contract.current_balance >= Decimal::ZERO);
        assert!(contract.current_balance <= contract.original_amount);

        let transactions = billing_transaction::Entity::find()
            .all(&fixture.db)
            .await
            .unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].transaction_number, "TXN-A000001");
        assert_eq!(transactions[0].status, TransactionStatus::Draft);
        assert_eq!(transactions[0].source, TransactionSource::AutoDrawdown);
    }

    #[tokio::test]
    async fn one_failing_contract_does_not_abort_the_run() {
        let fixture = testing::Fixture::new().await;
        // Contract #2 has a balance that cannot cover a weekly drawdown.
        let broke = fixture
            .add_contract(
                DrawdownRate::Weekly,
                Decimal::new(5000, 2),  // 50.00
                Decimal::new(10000, 2), // needs 700.00
                None,
            )
            .await;
        let third = fixture
            .add_contract(
                DrawdownRate::Daily,
                Decimal::new(100000, 2),
                Decimal::new(10000, 2),
                None,
            )
            .await;

        let today = date(2024, 1, 2);
        let contracts = vec![fixture.contract.clone(), broke.clone(), third];
        let summary = run_drawdowns(&fixture.db, &contracts, today, at_midnight(today)).await;

        assert_eq!(summary.processed_contracts, 3);
        assert_eq!(summary.successful_transactions, 2);
        assert_eq!(summary.failed_transactions, 1);
        assert_eq!(summary.status(), RunStatus::Partial);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].contract_id, broke.id);
        assert!(summary.errors[0].message.contains("insufficient balance"));

        // The failed contract is untouched.
        let untouched = funding_contract::Entity::find_by_id(broke.id)
            .one(&fixture.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.current_balance, Decimal::new(5000, 2));
        assert_eq!(untouched.last_drawdown_date, None);
    }

    #[tokio::test]
    async fn concurrent_balance_edit_triggers_compensating_delete() {
        let fixture = testing::Fixture::new().await;
        let stale = fixture.contract.clone();

        // Simulate a concurrent edit between the eligibility scan and the
        // drawdown: the database balance drops below the drawdown amount
        // while our in-memory model still shows plenty.
        let mut edited = fixture.contract.clone().into_active_model();
        edited.current_balance = Set(Decimal::new(1000, 2)); // 10.00
        edited.update(&fixture.db).await.unwrap();

        let today = date(2024, 1, 2);
        let summary =
            run_drawdowns(&fixture.db, &[stale], today, at_midnight(today)).await;

        assert_eq!(summary.failed_transactions, 1);
        assert_eq!(summary.status(), RunStatus::Failed);

        // No orphaned transaction remains and the balance was not touched.
        let transactions = billing_transaction::Entity::find()
            .all(&fixture.db)
            .await
            .unwrap();
        assert!(transactions.is_empty());
        let contract = funding_contract::Entity::find_by_id(fixture.contract.id)
            .one(&fixture.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contract.current_balance, Decimal::new(1000, 2));
    }
}
