use anyhow::Result;
use chrono::Utc;
use common::RunOutcome;
use engine::notify::LogNotifier;
use engine::scheduler::run_billing_cycle;
use sea_orm::Database;
use tracing::{debug, error, info, trace, warn};

use crate::config::load_automation_config;

/// Run one forced billing cycle from the command line. The run-window gate
/// is bypassed; the once-per-day guard still applies.
pub async fn run_drawdowns(organization_id: i32, database_url: &str) -> Result<()> {
    trace!("Entering run_drawdowns function");
    info!("Running billing cycle for organization {}", organization_id);
    debug!("Database URL: {}", database_url);

    trace!("Attempting to connect to database");
    let db = match Database::connect(database_url).await {
        Ok(connection) => {
            debug!("Database connection established");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    let automation = load_automation_config()?;
    debug!(
        "Automation configured for timezone {} at {}",
        automation.timezone, automation.run_time
    );

    let notifier = LogNotifier;
    trace!("Invoking billing cycle");
    let outcome = match run_billing_cycle(
        &db,
        organization_id,
        &automation,
        &notifier,
        Utc::now(),
        true,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                "Billing cycle for organization {} failed: {}",
                organization_id, e
            );
            return Err(e.into());
        }
    };

    match outcome {
        RunOutcome::NotDue => {
            // Unreachable with force set, kept for completeness.
            warn!("Billing cycle reported not due");
        }
        RunOutcome::AlreadyRan => {
            info!(
                "Billing cycle already ran today for organization {}",
                organization_id
            );
        }
        RunOutcome::Completed { status, summary } => {
            info!(
                "Billing cycle completed with status {}: {}",
                status.as_str(),
                summary.narrative()
            );
        }
    }

    trace!("run_drawdowns function completed");
    Ok(())
}
