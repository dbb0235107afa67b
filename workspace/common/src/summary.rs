use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Overall outcome of one automation run, derived from per-contract results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every eligible contract produced a transaction (including the
    /// degenerate case of zero eligible contracts).
    Success,
    /// Some contracts succeeded and some failed.
    Partial,
    /// Every eligible contract failed.
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }
}

/// A single contract that failed during a drawdown run. The run continues
/// past failures; these entries are the only record of what went wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DrawdownFailure {
    pub contract_id: i32,
    pub message: String,
}

/// Counts of successful transactions per drawdown cadence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FrequencyBreakdown {
    pub daily: u32,
    pub weekly: u32,
    pub monthly: u32,
}

/// Structured result of one drawdown generator run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RunSummary {
    /// Contracts the generator attempted to process.
    pub processed_contracts: u32,
    /// Transactions created and funded.
    pub successful_transactions: u32,
    /// Contracts whose drawdown failed (see `errors`).
    pub failed_transactions: u32,
    /// Sum of all successfully drawn amounts.
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    /// Successful transactions broken down by cadence.
    pub frequency: FrequencyBreakdown,
    /// Per-contract failure detail, in contract-selection order.
    pub errors: Vec<DrawdownFailure>,
}

impl RunSummary {
    pub fn status(&self) -> RunStatus {
        if self.failed_transactions == 0 {
            RunStatus::Success
        } else if self.successful_transactions == 0 {
            RunStatus::Failed
        } else {
            RunStatus::Partial
        }
    }

    /// Human-readable narrative stored on the automation log entry and
    /// included in the emailed report.
    pub fn narrative(&self) -> String {
        let mut text = format!(
            "Processed {} contract(s): {} transaction(s) generated totalling {}, {} failed \
             (daily: {}, weekly: {}, monthly: {}).",
            self.processed_contracts,
            self.successful_transactions,
            self.total_amount.round_dp(2),
            self.failed_transactions,
            self.frequency.daily,
            self.frequency.weekly,
            self.frequency.monthly,
        );
        for error in &self.errors {
            text.push_str(&format!(
                "\nContract {}: {}",
                error.contract_id, error.message
            ));
        }
        text
    }
}

/// Result of one scheduler invocation. Off-window and duplicate invocations
/// are reported explicitly rather than silently doing nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Wall clock did not match the configured run time.
    NotDue,
    /// An automation log entry already exists for today.
    AlreadyRan,
    /// The cycle executed; the summary describes what happened.
    Completed { status: RunStatus, summary: RunSummary },
}
