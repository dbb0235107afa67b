//! Contract eligibility scanning.
//!
//! Read-only: nothing here mutates state, so the scanner is safe to call
//! repeatedly. Two gates apply: a coarse per-invocation "is it time to run
//! today" check against the organization's configured run time, and a
//! per-contract cadence check against `last_drawdown_date`.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Timelike, Utc};
use common::AutomationConfig;
use model::entities::funding_contract::{self, ContractStatus, DrawdownRate};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

use crate::error::Result;

/// Whether the wall clock in the configured timezone matches the configured
/// run time to the minute. Applied once per invocation; an hourly cron
/// backing a daily job is a no-op outside this window.
pub fn is_run_window(now: DateTime<Utc>, config: &AutomationConfig) -> bool {
    let local = config.local_time(now);
    local.hour() == config.run_time.hour() && local.minute() == config.run_time.minute()
}

/// The first date on which a contract last drawn on `last` is due again.
/// Monthly cadence lands on the same calendar day, clamped at month-end
/// (Jan 31 -> Feb 29 in a leap year).
pub fn next_due_date(last: NaiveDate, rate: DrawdownRate) -> NaiveDate {
    match rate {
        DrawdownRate::Daily => last + Days::new(1),
        DrawdownRate::Weekly => last + Days::new(7),
        DrawdownRate::Monthly => last + Months::new(1),
    }
}

/// Pure cadence check: is this contract due for a drawdown on `today`
/// (a date in the organization's timezone)?
pub fn is_contract_due(contract: &funding_contract::Model, today: NaiveDate) -> bool {
    if contract.status != ContractStatus::Active
        || !contract.auto_drawdown
        || contract.current_balance <= Decimal::ZERO
    {
        return false;
    }
    if today < contract.start_date {
        return false;
    }
    if let Some(end) = contract.end_date {
        if today > end {
            return false;
        }
    }
    match contract.last_drawdown_date {
        // Never drawn down: due at the first opportunity.
        None => true,
        Some(last) => today >= next_due_date(last, contract.drawdown_rate),
    }
}

/// All contracts for the organization that are due for an automatic
/// drawdown on `today`. Returned in id order so run summaries are
/// deterministic.
pub async fn eligible_contracts<C: ConnectionTrait>(
    db: &C,
    organization_id: i32,
    today: NaiveDate,
) -> Result<Vec<funding_contract::Model>> {
    let candidates = funding_contract::Entity::find()
        .filter(funding_contract::Column::OrganizationId.eq(organization_id))
        .filter(funding_contract::Column::Status.eq(ContractStatus::Active))
        .filter(funding_contract::Column::AutoDrawdown.eq(true))
        .order_by_asc(funding_contract::Column::Id)
        .all(db)
        .await?;

    let total = candidates.len();
    let due: Vec<_> = candidates
        .into_iter()
        .filter(|contract| is_contract_due(contract, today))
        .collect();
    debug!(
        organization_id,
        %today,
        candidates = total,
        due = due.len(),
        "scanned contracts for drawdown eligibility"
    );
    Ok(due)
}
