//! Notification dispatch seam.
//!
//! The actual transport (email service) is an external collaborator; the
//! engine only knows how to hand it a structured report. Dispatch is
//! fire-and-forget: the scheduler logs send failures and never fails the
//! run because of them.

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{RunStatus, RunSummary};
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
#[error("notification dispatch failed: {0}")]
pub struct NotifyError(pub String);

/// Structured completion report for one automation run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub organization_id: i32,
    pub run_date: NaiveDate,
    pub status: RunStatus,
    pub summary: RunSummary,
    pub narrative: String,
    pub recipients: Vec<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send the per-run completion report (success or partial, with details).
    async fn send_run_report(&self, report: &RunReport) -> Result<(), NotifyError>;

    /// Send a distinct failure notification when a fatal error escapes the
    /// whole run.
    async fn send_run_failure(
        &self,
        organization_id: i32,
        recipients: &[String],
        error: &str,
    ) -> Result<(), NotifyError>;
}

/// Default notifier: writes structured tracing events instead of dispatching
/// to a mail transport. Deployments wire a real transport behind the trait.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_run_report(&self, report: &RunReport) -> Result<(), NotifyError> {
        info!(
            organization_id = report.organization_id,
            run_date = %report.run_date,
            status = report.status.as_str(),
            recipients = report.recipients.join(", "),
            narrative = %report.narrative,
            "automation run report"
        );
        Ok(())
    }

    async fn send_run_failure(
        &self,
        organization_id: i32,
        recipients: &[String],
        error: &str,
    ) -> Result<(), NotifyError> {
        error!(
            organization_id,
            recipients = recipients.join(", "),
            error,
            "automation run failed"
        );
        Ok(())
    }
}
