use model::entities::claim::ClaimStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for the engine.
///
/// Business-rule violations (insufficient balance, no matching transactions,
/// disallowed transitions) are reported and never retried; identifier races
/// are retried up to a ceiling and surface here only once exhausted.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Identifier allocation lost the race more times than the retry ceiling allows
    #[error("identifier allocation for prefix '{prefix}' exhausted after {attempts} attempts")]
    IdAllocationExhausted { prefix: String, attempts: u32 },

    /// Drawdown would push the contract balance negative
    #[error(
        "insufficient balance on contract {contract_id}: balance {balance} < drawdown {amount}"
    )]
    InsufficientBalance {
        contract_id: i32,
        balance: Decimal,
        amount: Decimal,
    },

    /// Claim packaging matched no draft transactions
    #[error("no draft transactions matched the claim filters")]
    NoEligibleTransactions,

    /// Requested claim status change is not on the allow-list
    #[error("claim status transition {from:?} -> {to:?} is not allowed")]
    InvalidTransition { from: ClaimStatus, to: ClaimStatus },

    /// Referenced claim does not exist
    #[error("claim {0} not found")]
    ClaimNotFound(i32),

    /// Referenced contract does not exist
    #[error("contract {0} not found")]
    ContractNotFound(i32),

    /// Invalid JSON payloads on stored filters or reconciliation results
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether this error is a business-rule violation (maps to a 4xx at the
    /// API boundary) rather than an infrastructure failure.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientBalance { .. }
                | EngineError::NoEligibleTransactions
                | EngineError::InvalidTransition { .. }
                | EngineError::ClaimNotFound(_)
                | EngineError::ContractNotFound(_)
        )
    }
}

/// Type alias for Result with EngineError
pub type Result<T> = std::result::Result<T, EngineError>;
