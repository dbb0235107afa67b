use axum::http::StatusCode;
use axum::response::Json;
use common::{AutomationConfig, ClaimFilters, DrawdownFailure, FrequencyBreakdown, RunOutcome, RunStatus, RunSummary};
use engine::EngineError;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Organization automation settings, loaded once at startup
    pub automation: AutomationConfig,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Map an engine error onto the API envelope: business-rule violations are
/// 4xx, infrastructure failures are 5xx.
pub fn engine_error_response(err: EngineError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match &err {
        EngineError::NoEligibleTransactions => (StatusCode::BAD_REQUEST, "NO_ELIGIBLE_TRANSACTIONS"),
        EngineError::InsufficientBalance { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_BALANCE"),
        EngineError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
        EngineError::ClaimNotFound(_) => (StatusCode::NOT_FOUND, "CLAIM_NOT_FOUND"),
        EngineError::ContractNotFound(_) => (StatusCode::NOT_FOUND, "CONTRACT_NOT_FOUND"),
        EngineError::IdAllocationExhausted { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "ID_ALLOCATION_EXHAUSTED")
        }
        EngineError::Database(_) | EngineError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::automation::trigger_run,
        crate::handlers::automation::get_runs,
        crate::handlers::residents::create_resident,
        crate::handlers::residents::get_residents,
        crate::handlers::contracts::create_contract,
        crate::handlers::contracts::get_contracts,
        crate::handlers::contracts::get_contract,
        crate::handlers::contracts::activate_contract,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::get_transactions,
        crate::handlers::claims::create_claim,
        crate::handlers::claims::get_claims,
        crate::handlers::claims::get_claim,
        crate::handlers::claims::transition_claim_status,
        crate::handlers::claims::record_claim_reconciliation,
        crate::handlers::claims::mark_claim_paid,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            ClaimFilters,
            RunOutcome,
            RunStatus,
            RunSummary,
            DrawdownFailure,
            FrequencyBreakdown,
            crate::handlers::automation::TriggerRunRequest,
            crate::handlers::automation::AutomationRunResponse,
            crate::handlers::residents::CreateResidentRequest,
            crate::handlers::residents::ResidentResponse,
            crate::handlers::contracts::CreateContractRequest,
            crate::handlers::contracts::ContractResponse,
            crate::handlers::transactions::CreateTransactionRequest,
            crate::handlers::transactions::TransactionResponse,
            crate::handlers::claims::CreateClaimRequest,
            crate::handlers::claims::ClaimResponse,
            crate::handlers::claims::TransitionRequest,
            crate::handlers::claims::ReconciliationRequest,
            crate::handlers::claims::ReconciliationResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "automation", description = "Scheduled drawdown run endpoints"),
        (name = "residents", description = "Resident reference endpoints"),
        (name = "contracts", description = "Funding contract endpoints"),
        (name = "transactions", description = "Billing transaction endpoints"),
        (name = "claims", description = "Claim packaging and lifecycle endpoints"),
    ),
    info(
        title = "SdaBill API",
        description = "SDA provider billing platform - automated funding drawdown and claims engine",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
