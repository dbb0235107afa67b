//! Sequential, human-readable identifier allocation (`PREFIX-A000123`).
//!
//! Identifiers are allocated by scanning the current maximum numeric suffix
//! in the namespace, incrementing, and attempting the insert. Concurrent
//! allocators race on the unique index; the loser retries with a fresh scan
//! and an incrementing backoff, up to [`MAX_ATTEMPTS`]. There is no
//! database-side counter: pure sequential identifiers stay auditable and the
//! retry loop absorbs the residual race at the cost of a little latency
//! under contention.

use std::future::Future;
use std::time::Duration;

use model::entities::{billing_transaction, claim};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect, SqlErr};
use tracing::warn;

use crate::error::{EngineError, Result};

/// Prefix for billing transaction numbers.
pub const TRANSACTION_PREFIX: &str = "TXN";
/// Prefix for claim numbers.
pub const CLAIM_PREFIX: &str = "CLM";
/// Retry ceiling for allocation races. Exceeding it fails the single unit
/// of work loudly; the record is never silently skipped.
pub const MAX_ATTEMPTS: u32 = 5;

/// Format a sequence number as an identifier, zero-padded to six digits.
pub fn format_identifier(prefix: &str, sequence: u64) -> String {
    format!("{}-A{:06}", prefix, sequence)
}

/// Parse the numeric suffix out of an identifier in this namespace.
///
/// Tolerates decorative suffixes appended by earlier schemes: both
/// `TXN-A000042` and `TXN-A000042-99` parse as 42. Anything that does not
/// start with `PREFIX-A<digits>` is ignored.
fn parse_sequence(identifier: &str, prefix: &str) -> Option<u64> {
    let rest = identifier.strip_prefix(prefix)?.strip_prefix("-A")?;
    let digits: &str = &rest[..rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len())];
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Compute the next identifier given every existing identifier in the
/// namespace. An empty namespace is the sequence start, not an error:
/// the first identifier is `PREFIX-A000001`.
pub fn next_in_sequence<'a, I>(existing: I, prefix: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(|id| parse_sequence(id, prefix))
        .max()
        .unwrap_or(0);
    format_identifier(prefix, max + 1)
}

/// Scan the transaction-number namespace and return the next identifier.
pub async fn next_transaction_number<C: ConnectionTrait>(db: &C) -> Result<String> {
    let existing: Vec<String> = billing_transaction::Entity::find()
        .select_only()
        .column(billing_transaction::Column::TransactionNumber)
        .filter(
            billing_transaction::Column::TransactionNumber
                .starts_with(format!("{}-A", TRANSACTION_PREFIX)),
        )
        .into_tuple()
        .all(db)
        .await?;
    Ok(next_in_sequence(
        existing.iter().map(String::as_str),
        TRANSACTION_PREFIX,
    ))
}

/// Scan the claim-number namespace and return the next identifier.
pub async fn next_claim_number<C: ConnectionTrait>(db: &C) -> Result<String> {
    let existing: Vec<String> = claim::Entity::find()
        .select_only()
        .column(claim::Column::ClaimNumber)
        .filter(claim::Column::ClaimNumber.starts_with(format!("{}-A", CLAIM_PREFIX)))
        .into_tuple()
        .all(db)
        .await?;
    Ok(next_in_sequence(
        existing.iter().map(String::as_str),
        CLAIM_PREFIX,
    ))
}

/// Whether a database error is a unique-constraint violation, i.e. a lost
/// allocation race rather than a real failure.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(50 * u64::from(attempt))
}

/// Run one scan-and-insert attempt up to [`MAX_ATTEMPTS`] times, retrying
/// only on unique-constraint violations. Every other error propagates
/// immediately.
pub async fn with_allocation_retry<T, F, Fut>(prefix: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for n in 1..=MAX_ATTEMPTS {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(EngineError::Database(err)) if is_unique_violation(&err) => {
                if n == MAX_ATTEMPTS {
                    warn!(
                        prefix,
                        attempts = MAX_ATTEMPTS,
                        "identifier allocation exhausted its retry ceiling"
                    );
                    return Err(EngineError::IdAllocationExhausted {
                        prefix: prefix.to_string(),
                        attempts: MAX_ATTEMPTS,
                    });
                }
                warn!(prefix, attempt = n, "identifier allocation race lost, retrying");
                tokio::time::sleep(backoff_delay(n)).await;
            }
            Err(err) => return Err(err),
        }
    }
    unreachable!("allocation retry loop returns within the attempt ceiling")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use model::entities::billing_transaction::{TransactionSource, TransactionStatus};
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, Set};

    #[test]
    fn sequence_parsing_tolerates_legacy_suffixes() {
        assert_eq!(parse_sequence("TXN-A000042", "TXN"), Some(42));
        assert_eq!(parse_sequence("TXN-A000042-99", "TXN"), Some(42));
        assert_eq!(parse_sequence("TXN-A000042rev2", "TXN"), Some(42));
        assert_eq!(parse_sequence("CLM-A000042", "TXN"), None);
        assert_eq!(parse_sequence("TXN-B000042", "TXN"), None);
        assert_eq!(parse_sequence("TXN-A", "TXN"), None);
    }

    #[test]
    fn next_in_sequence_skips_past_legacy_variants() {
        let existing = ["TXN-A000042", "TXN-A000042-99", "TXN-A000007"];
        assert_eq!(next_in_sequence(existing, "TXN"), "TXN-A000043");
    }

    #[test]
    fn empty_namespace_starts_the_sequence() {
        assert_eq!(next_in_sequence([], "TXN"), "TXN-A000001");
        assert_eq!(next_in_sequence([], "CLM"), "CLM-A000001");
    }

    #[tokio::test]
    async fn scan_reads_current_maximum() {
        let fixture = testing::Fixture::new().await;
        fixture
            .insert_transaction("TXN-A000042", Decimal::new(10000, 2))
            .await;
        fixture
            .insert_transaction("TXN-A000042-99", Decimal::new(10000, 2))
            .await;

        let next = next_transaction_number(&fixture.db).await.unwrap();
        assert_eq!(next, "TXN-A000043");
    }

    #[tokio::test]
    async fn concurrent_allocators_produce_distinct_identifiers() {
        let fixture = testing::Fixture::new().await;
        let resident_id = fixture.resident.id;
        let contract_id = fixture.contract.id;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = fixture.db.clone();
            handles.push(tokio::spawn(async move {
                with_allocation_retry(TRANSACTION_PREFIX, || {
                    let db = db.clone();
                    async move {
                        let number = next_transaction_number(&db).await?;
                        let inserted = billing_transaction::ActiveModel {
                            transaction_number: Set(number),
                            organization_id: Set(1),
                            resident_id: Set(resident_id),
                            contract_id: Set(contract_id),
                            amount: Set(Decimal::new(10000, 2)),
                            occurred_at: Set(testing::occurred_at()),
                            service_code: Set("SDA_DAILY".to_string()),
                            status: Set(TransactionStatus::Draft),
                            claim_id: Set(None),
                            source: Set(TransactionSource::Manual),
                            ..Default::default()
                        }
                        .insert(&db)
                        .await?;
                        Ok(inserted.transaction_number)
                    }
                })
                .await
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().expect("allocation should succeed"));
        }
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 8, "every caller got a distinct identifier");
    }

    #[tokio::test]
    async fn allocation_fails_loudly_after_retry_ceiling() {
        let fixture = testing::Fixture::new().await;
        fixture
            .insert_transaction("TXN-A000001", Decimal::new(10000, 2))
            .await;
        let resident_id = fixture.resident.id;
        let contract_id = fixture.contract.id;
        let db = &fixture.db;

        // Every attempt collides with the already-taken number, standing in
        // for a contender that keeps winning the race.
        let result: Result<()> = with_allocation_retry(TRANSACTION_PREFIX, move || async move {
            billing_transaction::ActiveModel {
                transaction_number: Set("TXN-A000001".to_string()),
                organization_id: Set(1),
                resident_id: Set(resident_id),
                contract_id: Set(contract_id),
                amount: Set(Decimal::new(10000, 2)),
                occurred_at: Set(testing::occurred_at()),
                service_code: Set("SDA_DAILY".to_string()),
                status: Set(TransactionStatus::Draft),
                claim_id: Set(None),
                source: Set(TransactionSource::Manual),
                ..Default::default()
            }
            .insert(db)
            .await?;
            Ok(())
        })
        .await;

        match result {
            Err(EngineError::IdAllocationExhausted { prefix, attempts }) => {
                assert_eq!(prefix, TRANSACTION_PREFIX);
                assert_eq!(attempts, MAX_ATTEMPTS);
            }
            other => panic!("expected exhausted allocation, got {:?}", other),
        }

        // Nothing beyond the seeded row was written.
        let count = billing_transaction::Entity::find()
            .all(&fixture.db)
            .await
            .unwrap()
            .len();
        assert_eq!(count, 1);
    }
}
