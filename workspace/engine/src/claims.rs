//! Claim packaging.
//!
//! Groups draft transactions matching filter criteria into a new claim and
//! atomically moves them to picked_up. There is no wrapping database
//! transaction: the cleanup path is an explicit compensating delete of the
//! claim row, so a claim can never be left holding zero transactions. (A
//! crash between the bulk transition and the compensating delete can still
//! orphan an empty claim; that gap is accepted and documented.)

use chrono::NaiveDateTime;
use common::ClaimFilters;
use model::entities::{
    billing_transaction::{self, TransactionStatus},
    claim::{self, ClaimStatus},
};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    Select, Set,
};
use tracing::{info, instrument, warn};

use crate::error::{EngineError, Result};
use crate::identifier::{self, CLAIM_PREFIX};

fn matching_drafts(organization_id: i32, filters: &ClaimFilters) -> Select<billing_transaction::Entity> {
    let mut query = billing_transaction::Entity::find()
        .filter(billing_transaction::Column::OrganizationId.eq(organization_id))
        .filter(billing_transaction::Column::Status.eq(TransactionStatus::Draft));
    if let Some(resident_id) = filters.resident_id {
        query = query.filter(billing_transaction::Column::ResidentId.eq(resident_id));
    }
    if let Some(from) = filters.date_from {
        query = query.filter(
            billing_transaction::Column::OccurredAt.gte(from.and_hms_opt(0, 0, 0).unwrap()),
        );
    }
    if let Some(to) = filters.date_to {
        // date_to is inclusive: everything before the following midnight.
        // NaiveDate::MAX has no successor; it simply leaves the upper end
        // unbounded.
        if let Some(upper) = to.succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) {
            query = query.filter(billing_transaction::Column::OccurredAt.lt(upper));
        }
    }
    query
}

async fn rollback_claim<C: ConnectionTrait>(db: &C, claim_id: i32) {
    if let Err(err) = claim::Entity::delete_by_id(claim_id).exec(db).await {
        // Nothing more we can do here; the orphaned draft claim has zero
        // linked transactions and is safe to delete by hand.
        warn!(claim_id, error = %err, "compensating claim delete failed");
    }
}

/// Create a new claim and bind every matching draft transaction to it.
///
/// Fails with [`EngineError::NoEligibleTransactions`] when nothing matches;
/// in every failure path after the claim row exists, the claim is deleted
/// again so no zero-transaction claim survives.
#[instrument(skip(db, filters))]
pub async fn package_claim<C: ConnectionTrait>(
    db: &C,
    organization_id: i32,
    created_by: &str,
    filters: &ClaimFilters,
    now: NaiveDateTime,
) -> Result<claim::Model> {
    let filters_json = serde_json::to_string(filters)?;
    let filters_json = filters_json.as_str();

    let claim = identifier::with_allocation_retry(CLAIM_PREFIX, move || async move {
        let number = identifier::next_claim_number(db).await?;
        let inserted = claim::ActiveModel {
            claim_number: Set(number),
            organization_id: Set(organization_id),
            created_by: Set(created_by.to_string()),
            filters_json: Set(filters_json.to_string()),
            transaction_count: Set(0),
            total_amount: Set(Decimal::ZERO),
            status: Set(ClaimStatus::Draft),
            submitted_at: Set(None),
            submitted_by: Set(None),
            file_generated_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(inserted)
    })
    .await?;

    let selected = match matching_drafts(organization_id, filters).all(db).await {
        Ok(rows) => rows,
        Err(err) => {
            rollback_claim(db, claim.id).await;
            return Err(err.into());
        }
    };
    if selected.is_empty() {
        rollback_claim(db, claim.id).await;
        return Err(EngineError::NoEligibleTransactions);
    }

    let ids: Vec<i32> = selected.iter().map(|t| t.id).collect();
    let transitioned = billing_transaction::Entity::update_many()
        .col_expr(
            billing_transaction::Column::Status,
            Expr::value(TransactionStatus::PickedUp),
        )
        .col_expr(billing_transaction::Column::ClaimId, Expr::value(claim.id))
        .filter(billing_transaction::Column::Id.is_in(ids))
        .filter(billing_transaction::Column::Status.eq(TransactionStatus::Draft))
        .exec(db)
        .await;

    match transitioned {
        Ok(result) if result.rows_affected > 0 => {}
        Ok(_) => {
            // Every selected row raced away to another packager.
            rollback_claim(db, claim.id).await;
            return Err(EngineError::NoEligibleTransactions);
        }
        Err(err) => {
            rollback_claim(db, claim.id).await;
            return Err(err.into());
        }
    }

    let claim = recalculate_claim_aggregates(db, claim.id).await?;
    info!(
        claim_id = claim.id,
        claim_number = %claim.claim_number,
        transactions = claim.transaction_count,
        total = %claim.total_amount,
        "claim packaged"
    );
    Ok(claim)
}

/// Recompute `transaction_count` and `total_amount` from the transactions
/// currently linked to the claim with non-cancelled status, and store them
/// on the claim row. Called at every point that mutates the linked set.
pub async fn recalculate_claim_aggregates<C: ConnectionTrait>(
    db: &C,
    claim_id: i32,
) -> Result<claim::Model> {
    let linked = billing_transaction::Entity::find()
        .filter(billing_transaction::Column::ClaimId.eq(claim_id))
        .filter(billing_transaction::Column::Status.ne(TransactionStatus::Cancelled))
        .all(db)
        .await?;

    let claim = claim::Entity::find_by_id(claim_id)
        .one(db)
        .await?
        .ok_or(EngineError::ClaimNotFound(claim_id))?;

    let mut active = claim.into_active_model();
    active.transaction_count = Set(linked.len() as i32);
    active.total_amount = Set(linked.iter().map(|t| t.amount).sum());
    Ok(active.update(db).await?)
}
