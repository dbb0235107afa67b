//! Claim lifecycle management.
//!
//! A state machine over `ClaimStatus`: every requested transition is checked
//! against an explicit allow-list before anything is written, reconciliation
//! uploads are appended as records, and settlement can be confirmed by bulk-
//! moving a claim's picked_up transactions to paid.

use chrono::NaiveDateTime;
use model::entities::{
    billing_transaction::{self, TransactionStatus},
    claim::{self, ClaimStatus},
    claim_reconciliation,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};
use tracing::{info, instrument};

use crate::error::{EngineError, Result};

/// The transitions a claim in `from` may take. Paid and Rejected are
/// terminal; PartiallyPaid may still resolve to either.
pub fn allowed_transitions(from: ClaimStatus) -> &'static [ClaimStatus] {
    use ClaimStatus::*;
    match from {
        Draft => &[InProgress, Submitted, AutomationSubmitted],
        InProgress => &[Processed, Submitted],
        Processed => &[Submitted],
        Submitted => &[Paid, Rejected, PartiallyPaid],
        AutomationSubmitted => &[AutoProcessed, Paid, Rejected, PartiallyPaid],
        AutoProcessed => &[Paid, Rejected, PartiallyPaid],
        PartiallyPaid => &[Paid, Rejected],
        Paid | Rejected => &[],
    }
}

pub fn is_transition_allowed(from: ClaimStatus, to: ClaimStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Apply a validated status transition. Invalid requests are rejected
/// without mutating the claim. Submission states stamp submitted_at and
/// submitted_by.
#[instrument(skip(db, actor))]
pub async fn transition_claim<C: ConnectionTrait>(
    db: &C,
    claim_id: i32,
    to: ClaimStatus,
    actor: Option<&str>,
    now: NaiveDateTime,
) -> Result<claim::Model> {
    let claim = claim::Entity::find_by_id(claim_id)
        .one(db)
        .await?
        .ok_or(EngineError::ClaimNotFound(claim_id))?;

    let from = claim.status;
    if !is_transition_allowed(from, to) {
        return Err(EngineError::InvalidTransition { from, to });
    }

    let mut active = claim.into_active_model();
    active.status = Set(to);
    if matches!(to, ClaimStatus::Submitted | ClaimStatus::AutomationSubmitted) {
        active.submitted_at = Set(Some(now));
        active.submitted_by = Set(actor.map(str::to_string));
    }
    let updated = active.update(db).await?;
    info!(claim_id, ?from, ?to, "claim status transitioned");
    Ok(updated)
}

/// Totals parsed out of a regulator response file.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationUpload {
    pub uploaded_by: String,
    pub processed_count: i32,
    pub paid_count: i32,
    pub rejected_count: i32,
    pub error_count: i32,
    pub unmatched_count: i32,
    /// Raw per-line results, already serialized as JSON text.
    pub raw_results: Option<String>,
}

/// Append a reconciliation record for the claim and, when the caller has
/// decided one, apply the resulting status through the validated transition
/// path. The mapping from reconciliation outcome to claim status is
/// business policy owned by the caller, never inferred here. Nothing is
/// written when the requested transition is invalid.
#[instrument(skip(db, upload))]
pub async fn record_reconciliation<C: ConnectionTrait>(
    db: &C,
    claim_id: i32,
    upload: ReconciliationUpload,
    resulting_status: Option<ClaimStatus>,
    now: NaiveDateTime,
) -> Result<(claim_reconciliation::Model, claim::Model)> {
    let claim = claim::Entity::find_by_id(claim_id)
        .one(db)
        .await?
        .ok_or(EngineError::ClaimNotFound(claim_id))?;

    // Validate the requested transition up front so an invalid one leaves
    // no reconciliation record behind.
    if let Some(to) = resulting_status {
        if !is_transition_allowed(claim.status, to) {
            return Err(EngineError::InvalidTransition {
                from: claim.status,
                to,
            });
        }
    }

    let record = claim_reconciliation::ActiveModel {
        claim_id: Set(claim_id),
        uploaded_by: Set(upload.uploaded_by.clone()),
        processed_count: Set(upload.processed_count),
        paid_count: Set(upload.paid_count),
        rejected_count: Set(upload.rejected_count),
        error_count: Set(upload.error_count),
        unmatched_count: Set(upload.unmatched_count),
        raw_results: Set(upload.raw_results.clone()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let claim = match resulting_status {
        Some(to) => transition_claim(db, claim_id, to, Some(&upload.uploaded_by), now).await?,
        None => claim,
    };

    info!(
        claim_id,
        processed = upload.processed_count,
        paid = upload.paid_count,
        rejected = upload.rejected_count,
        "reconciliation recorded"
    );
    Ok((record, claim))
}

/// Bulk-confirm settlement: move the claim's picked_up transactions to
/// paid. Paid and rejected transactions are never touched. Returns the
/// number of transactions moved.
#[instrument(skip(db))]
pub async fn mark_claim_transactions_paid<C: ConnectionTrait>(
    db: &C,
    claim_id: i32,
) -> Result<u64> {
    claim::Entity::find_by_id(claim_id)
        .one(db)
        .await?
        .ok_or(EngineError::ClaimNotFound(claim_id))?;

    let result = billing_transaction::Entity::update_many()
        .col_expr(
            billing_transaction::Column::Status,
            Expr::value(TransactionStatus::Paid),
        )
        .filter(billing_transaction::Column::ClaimId.eq(claim_id))
        .filter(billing_transaction::Column::Status.eq(TransactionStatus::PickedUp))
        .exec(db)
        .await?;

    info!(claim_id, moved = result.rows_affected, "claim transactions settled");
    Ok(result.rows_affected)
}
