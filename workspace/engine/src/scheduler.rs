//! Run scheduler and idempotency guard.
//!
//! Orchestrates one invocation of the billing cycle: the run-window gate,
//! the "already ran today" check against the automation log, the scan and
//! generate steps, the single log entry, and the completion notification.
//! Invocations are short-lived request handlers; there is no in-process
//! scheduler thread, and nothing is cached between runs.

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{AutomationConfig, RunOutcome, RunStatus};
use model::entities::automation_run::{self, AutomationRunStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::notify::{Notifier, RunReport};
use crate::{drawdown, eligibility, identifier};

fn run_status_to_db(status: RunStatus) -> AutomationRunStatus {
    match status {
        RunStatus::Success => AutomationRunStatus::Success,
        RunStatus::Partial => AutomationRunStatus::Partial,
        RunStatus::Failed => AutomationRunStatus::Failed,
    }
}

/// Execute one billing cycle for the organization, at most once per day.
///
/// `force` bypasses the run-window minute gate (operator-triggered runs),
/// never the once-per-day guard. A fatal error writes no log entry, so the
/// next invocation sees "no entry for today" and retries naturally; a
/// best-effort failure notification is attempted before propagating.
#[instrument(skip(db, config, notifier))]
pub async fn run_billing_cycle<C: ConnectionTrait>(
    db: &C,
    organization_id: i32,
    config: &AutomationConfig,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
    force: bool,
) -> Result<RunOutcome> {
    if !force && !eligibility::is_run_window(now, config) {
        return Ok(RunOutcome::NotDue);
    }

    let today = config.local_date(now);
    let existing = automation_run::Entity::find()
        .filter(automation_run::Column::OrganizationId.eq(organization_id))
        .filter(automation_run::Column::RunDate.eq(today))
        .one(db)
        .await?;
    if existing.is_some() {
        info!(organization_id, run_date = %today, "billing cycle already ran today, skipping");
        return Ok(RunOutcome::AlreadyRan);
    }

    let started = Instant::now();
    let local_now = now.with_timezone(&config.timezone).naive_local();

    let contracts = match eligibility::eligible_contracts(db, organization_id, today).await {
        Ok(contracts) => contracts,
        Err(err) => {
            // Fatal: no log entry is written, the failure notification is
            // best-effort, and the error propagates to the caller.
            if let Err(notify_err) = notifier
                .send_run_failure(organization_id, &config.notify_emails, &err.to_string())
                .await
            {
                warn!(error = %notify_err, "failure notification could not be sent");
            }
            return Err(err);
        }
    };

    let summary = drawdown::run_drawdowns(db, &contracts, today, local_now).await;
    let status = summary.status();
    let narrative = summary.narrative();
    let execution_time_ms = started.elapsed().as_millis() as i64;

    let errors_json = if summary.errors.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&summary.errors)?)
    };

    let log_entry = automation_run::ActiveModel {
        organization_id: Set(organization_id),
        run_date: Set(today),
        status: Set(run_status_to_db(status)),
        processed_contracts: Set(summary.processed_contracts as i32),
        successful_transactions: Set(summary.successful_transactions as i32),
        failed_transactions: Set(summary.failed_transactions as i32),
        total_amount: Set(summary.total_amount),
        execution_time_ms: Set(execution_time_ms),
        errors_json: Set(errors_json),
        summary: Set(narrative.clone()),
        created_at: Set(local_now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match log_entry {
        Ok(_) => {}
        // A duplicate cron trigger in the same minute slipped past the
        // check above and logged first. Our contract loop has already run;
        // surface that honestly rather than failing the invocation.
        Err(err) if identifier::is_unique_violation(&err) => {
            warn!(
                organization_id,
                run_date = %today,
                "concurrent trigger already wrote today's log entry"
            );
        }
        Err(err) => {
            if let Err(notify_err) = notifier
                .send_run_failure(organization_id, &config.notify_emails, &err.to_string())
                .await
            {
                warn!(error = %notify_err, "failure notification could not be sent");
            }
            return Err(err.into());
        }
    }

    info!(
        organization_id,
        run_date = %today,
        status = status.as_str(),
        transactions = summary.successful_transactions,
        failed = summary.failed_transactions,
        execution_time_ms,
        "billing cycle completed"
    );

    let report = RunReport {
        organization_id,
        run_date: today,
        status,
        summary: summary.clone(),
        narrative,
        recipients: config.notify_emails.clone(),
    };
    if let Err(err) = notifier.send_run_report(&report).await {
        warn!(error = %err, "run report could not be sent");
    }

    Ok(RunOutcome::Completed { status, summary })
}
