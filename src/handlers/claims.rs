use crate::schemas::{engine_error_response, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDateTime, Utc};
use common::ClaimFilters;
use engine::claims::package_claim;
use engine::lifecycle::{
    self, mark_claim_transactions_paid, record_reconciliation, ReconciliationUpload,
};
use model::entities::claim::{self, ClaimStatus};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for packaging a new claim from draft transactions
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateClaimRequest {
    pub organization_id: i32,
    /// Actor recorded as the claim's creator
    pub created_by: String,
    /// Selection filters; an empty object selects every draft transaction
    /// in the organization
    #[serde(default)]
    pub filters: ClaimFilters,
}

/// Request body for a claim status transition
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TransitionRequest {
    /// Target status, one of: draft, in_progress, processed, submitted,
    /// paid, rejected, partially_paid, automation_submitted, auto_processed
    pub status: String,
    pub actor: Option<String>,
}

/// Request body for recording a regulator reconciliation file
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReconciliationRequest {
    pub uploaded_by: String,
    pub processed_count: i32,
    pub paid_count: i32,
    pub rejected_count: i32,
    pub error_count: i32,
    pub unmatched_count: i32,
    /// Raw per-line results as JSON text
    pub raw_results: Option<String>,
    /// Claim status to apply as a result of this reconciliation, validated
    /// against the transition allow-list
    pub resulting_status: Option<String>,
}

/// Claim response model
#[derive(Debug, Serialize, ToSchema)]
pub struct ClaimResponse {
    pub id: i32,
    pub claim_number: String,
    pub organization_id: i32,
    pub created_by: String,
    pub filters_json: String,
    pub transaction_count: i32,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub status: String,
    pub submitted_at: Option<NaiveDateTime>,
    pub submitted_by: Option<String>,
}

impl From<claim::Model> for ClaimResponse {
    fn from(model: claim::Model) -> Self {
        Self {
            id: model.id,
            claim_number: model.claim_number,
            organization_id: model.organization_id,
            created_by: model.created_by,
            filters_json: model.filters_json,
            transaction_count: model.transaction_count,
            total_amount: model.total_amount,
            status: claim_status_str(model.status).to_string(),
            submitted_at: model.submitted_at,
            submitted_by: model.submitted_by,
        }
    }
}

/// Reconciliation record response model
#[derive(Debug, Serialize, ToSchema)]
pub struct ReconciliationResponse {
    pub id: i32,
    pub claim_id: i32,
    pub uploaded_by: String,
    pub processed_count: i32,
    pub paid_count: i32,
    pub rejected_count: i32,
    pub error_count: i32,
    pub unmatched_count: i32,
    pub created_at: NaiveDateTime,
    /// Claim as it stands after the reconciliation was applied
    pub claim: ClaimResponse,
}

fn claim_status_str(status: ClaimStatus) -> &'static str {
    match status {
        ClaimStatus::Draft => "draft",
        ClaimStatus::InProgress => "in_progress",
        ClaimStatus::Processed => "processed",
        ClaimStatus::Submitted => "submitted",
        ClaimStatus::Paid => "paid",
        ClaimStatus::Rejected => "rejected",
        ClaimStatus::PartiallyPaid => "partially_paid",
        ClaimStatus::AutomationSubmitted => "automation_submitted",
        ClaimStatus::AutoProcessed => "auto_processed",
    }
}

fn parse_claim_status(value: &str) -> Option<ClaimStatus> {
    match value {
        "draft" => Some(ClaimStatus::Draft),
        "in_progress" => Some(ClaimStatus::InProgress),
        "processed" => Some(ClaimStatus::Processed),
        "submitted" => Some(ClaimStatus::Submitted),
        "paid" => Some(ClaimStatus::Paid),
        "rejected" => Some(ClaimStatus::Rejected),
        "partially_paid" => Some(ClaimStatus::PartiallyPaid),
        "automation_submitted" => Some(ClaimStatus::AutomationSubmitted),
        "auto_processed" => Some(ClaimStatus::AutoProcessed),
        _ => None,
    }
}

fn unknown_status(value: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: format!("Unknown claim status: {value}"),
            code: "INVALID_STATUS".to_string(),
            success: false,
        }),
    )
}

/// Package a new claim from matching draft transactions
#[utoipa::path(
    post,
    path = "/api/v1/claims",
    tag = "claims",
    request_body = CreateClaimRequest,
    responses(
        (status = 201, description = "Claim packaged successfully", body = ApiResponse<ClaimResponse>),
        (status = 400, description = "No draft transactions match the filters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_claim(
    State(state): State<AppState>,
    Json(request): Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ClaimResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_claim function");
    debug!(
        "Packaging claim for organization {} by {}",
        request.organization_id, request.created_by
    );

    match package_claim(
        &state.db,
        request.organization_id,
        &request.created_by,
        &request.filters,
        Utc::now().naive_utc(),
    )
    .await
    {
        Ok(claim) => {
            info!(
                "Claim {} packaged with {} transactions totalling {}",
                claim.claim_number, claim.transaction_count, claim.total_amount
            );
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    ClaimResponse::from(claim),
                    "Claim packaged successfully",
                )),
            ))
        }
        Err(err) => {
            error!(
                "Failed to package claim for organization {}: {}",
                request.organization_id, err
            );
            Err(engine_error_response(err))
        }
    }
}

/// Get all claims
#[utoipa::path(
    get,
    path = "/api/v1/claims",
    tag = "claims",
    responses(
        (status = 200, description = "Claims retrieved successfully", body = ApiResponse<Vec<ClaimResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_claims(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ClaimResponse>>>, StatusCode> {
    trace!("Entering get_claims function");

    match claim::Entity::find()
        .order_by_desc(claim::Column::Id)
        .all(&state.db)
        .await
    {
        Ok(claims) => {
            debug!("Retrieved {} claims", claims.len());
            let responses: Vec<ClaimResponse> =
                claims.into_iter().map(ClaimResponse::from).collect();
            Ok(Json(ApiResponse::new(
                responses,
                "Claims retrieved successfully",
            )))
        }
        Err(db_error) => {
            error!("Failed to retrieve claims: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a single claim by ID
#[utoipa::path(
    get,
    path = "/api/v1/claims/{id}",
    tag = "claims",
    params(
        ("id" = i32, Path, description = "Claim ID")
    ),
    responses(
        (status = 200, description = "Claim retrieved successfully", body = ApiResponse<ClaimResponse>),
        (status = 404, description = "Claim not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ClaimResponse>>, StatusCode> {
    trace!("Entering get_claim function");

    match claim::Entity::find_by_id(id).one(&state.db).await {
        Ok(Some(claim)) => Ok(Json(ApiResponse::new(
            ClaimResponse::from(claim),
            "Claim retrieved successfully",
        ))),
        Ok(None) => {
            debug!("Claim {} not found", id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to retrieve claim {}: {}", id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Transition a claim to a new status
#[utoipa::path(
    post,
    path = "/api/v1/claims/{id}/status",
    tag = "claims",
    params(
        ("id" = i32, Path, description = "Claim ID")
    ),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Claim transitioned successfully", body = ApiResponse<ClaimResponse>),
        (status = 400, description = "Unknown target status", body = ErrorResponse),
        (status = 404, description = "Claim not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed from the current status", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn transition_claim_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<ApiResponse<ClaimResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering transition_claim_status function");
    debug!("Transitioning claim {} to {}", id, request.status);

    let Some(to) = parse_claim_status(&request.status) else {
        warn!("Unknown claim status: {}", request.status);
        return Err(unknown_status(&request.status));
    };

    match lifecycle::transition_claim(
        &state.db,
        id,
        to,
        request.actor.as_deref(),
        Utc::now().naive_utc(),
    )
    .await
    {
        Ok(claim) => {
            info!("Claim {} transitioned to {}", id, request.status);
            Ok(Json(ApiResponse::new(
                ClaimResponse::from(claim),
                "Claim transitioned successfully",
            )))
        }
        Err(err) => {
            error!("Failed to transition claim {}: {}", id, err);
            Err(engine_error_response(err))
        }
    }
}

/// Record a regulator reconciliation file against a claim
#[utoipa::path(
    post,
    path = "/api/v1/claims/{id}/reconciliations",
    tag = "claims",
    params(
        ("id" = i32, Path, description = "Claim ID")
    ),
    request_body = ReconciliationRequest,
    responses(
        (status = 201, description = "Reconciliation recorded successfully", body = ApiResponse<ReconciliationResponse>),
        (status = 400, description = "Unknown resulting status", body = ErrorResponse),
        (status = 404, description = "Claim not found", body = ErrorResponse),
        (status = 409, description = "Resulting status not allowed from the current status", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn record_claim_reconciliation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ReconciliationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReconciliationResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering record_claim_reconciliation function");
    debug!(
        "Recording reconciliation for claim {} by {}",
        id, request.uploaded_by
    );

    let resulting_status = match &request.resulting_status {
        Some(value) => match parse_claim_status(value) {
            Some(status) => Some(status),
            None => {
                warn!("Unknown resulting status: {}", value);
                return Err(unknown_status(value));
            }
        },
        None => None,
    };

    let upload = ReconciliationUpload {
        uploaded_by: request.uploaded_by.clone(),
        processed_count: request.processed_count,
        paid_count: request.paid_count,
        rejected_count: request.rejected_count,
        error_count: request.error_count,
        unmatched_count: request.unmatched_count,
        raw_results: request.raw_results.clone(),
    };

    match record_reconciliation(&state.db, id, upload, resulting_status, Utc::now().naive_utc())
        .await
    {
        Ok((record, claim)) => {
            info!(
                "Reconciliation recorded for claim {} ({} processed)",
                id, record.processed_count
            );
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    ReconciliationResponse {
                        id: record.id,
                        claim_id: record.claim_id,
                        uploaded_by: record.uploaded_by,
                        processed_count: record.processed_count,
                        paid_count: record.paid_count,
                        rejected_count: record.rejected_count,
                        error_count: record.error_count,
                        unmatched_count: record.unmatched_count,
                        created_at: record.created_at,
                        claim: ClaimResponse::from(claim),
                    },
                    "Reconciliation recorded successfully",
                )),
            ))
        }
        Err(err) => {
            error!("Failed to record reconciliation for claim {}: {}", id, err);
            Err(engine_error_response(err))
        }
    }
}

/// Move a claim's picked-up transactions to paid after settlement
#[utoipa::path(
    post,
    path = "/api/v1/claims/{id}/mark-paid",
    tag = "claims",
    params(
        ("id" = i32, Path, description = "Claim ID")
    ),
    responses(
        (status = 200, description = "Transactions settled successfully", body = ApiResponse<u64>),
        (status = 404, description = "Claim not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn mark_claim_paid(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<u64>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering mark_claim_paid function");
    debug!("Settling transactions for claim {}", id);

    match mark_claim_transactions_paid(&state.db, id).await {
        Ok(moved) => {
            info!("Settled {} transactions for claim {}", moved, id);
            Ok(Json(ApiResponse::new(
                moved,
                "Transactions settled successfully",
            )))
        }
        Err(err) => {
            error!("Failed to settle transactions for claim {}: {}", id, err);
            Err(engine_error_response(err))
        }
    }
}
