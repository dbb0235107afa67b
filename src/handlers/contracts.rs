use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::funding_contract::{self, ContractStatus, DrawdownRate, FundingSource};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating a new funding contract. New contracts always
/// start in draft status and must be activated explicitly.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateContractRequest {
    pub organization_id: i32,
    pub resident_id: i32,
    /// One of: ndia, plan_managed, self_managed
    pub funding_source: String,
    #[schema(value_type = String)]
    pub original_amount: Decimal,
    /// One of: daily, weekly, monthly
    pub drawdown_rate: String,
    pub auto_drawdown: bool,
    #[schema(value_type = String)]
    pub daily_support_item_cost: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Links a renewal back to the contract it replaces
    pub parent_contract_id: Option<i32>,
}

/// Funding contract response model
#[derive(Debug, Serialize, ToSchema)]
pub struct ContractResponse {
    pub id: i32,
    pub organization_id: i32,
    pub resident_id: i32,
    pub funding_source: String,
    #[schema(value_type = String)]
    pub original_amount: Decimal,
    #[schema(value_type = String)]
    pub current_balance: Decimal,
    pub drawdown_rate: String,
    pub auto_drawdown: bool,
    #[schema(value_type = String)]
    pub daily_support_item_cost: Decimal,
    pub last_drawdown_date: Option<NaiveDate>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    pub parent_contract_id: Option<i32>,
}

impl From<funding_contract::Model> for ContractResponse {
    fn from(model: funding_contract::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            resident_id: model.resident_id,
            funding_source: match model.funding_source {
                FundingSource::Ndia => "ndia".to_string(),
                FundingSource::PlanManaged => "plan_managed".to_string(),
                FundingSource::SelfManaged => "self_managed".to_string(),
            },
            original_amount: model.original_amount,
            current_balance: model.current_balance,
            drawdown_rate: match model.drawdown_rate {
                DrawdownRate::Daily => "daily".to_string(),
                DrawdownRate::Weekly => "weekly".to_string(),
                DrawdownRate::Monthly => "monthly".to_string(),
            },
            auto_drawdown: model.auto_drawdown,
            daily_support_item_cost: model.daily_support_item_cost,
            last_drawdown_date: model.last_drawdown_date,
            start_date: model.start_date,
            end_date: model.end_date,
            status: match model.status {
                ContractStatus::Draft => "draft".to_string(),
                ContractStatus::Active => "active".to_string(),
                ContractStatus::Expired => "expired".to_string(),
                ContractStatus::Cancelled => "cancelled".to_string(),
                ContractStatus::Renewed => "renewed".to_string(),
            },
            parent_contract_id: model.parent_contract_id,
        }
    }
}

fn parse_funding_source(value: &str) -> Option<FundingSource> {
    match value {
        "ndia" => Some(FundingSource::Ndia),
        "plan_managed" => Some(FundingSource::PlanManaged),
        "self_managed" => Some(FundingSource::SelfManaged),
        _ => None,
    }
}

fn parse_drawdown_rate(value: &str) -> Option<DrawdownRate> {
    match value {
        "daily" => Some(DrawdownRate::Daily),
        "weekly" => Some(DrawdownRate::Weekly),
        "monthly" => Some(DrawdownRate::Monthly),
        _ => None,
    }
}

fn bad_request(message: impl Into<String>, code: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Create a new funding contract in draft status
#[utoipa::path(
    post,
    path = "/api/v1/contracts",
    tag = "contracts",
    request_body = CreateContractRequest,
    responses(
        (status = 201, description = "Contract created successfully", body = ApiResponse<ContractResponse>),
        (status = 400, description = "Invalid funding source or drawdown rate", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_contract(
    State(state): State<AppState>,
    Json(request): Json<CreateContractRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ContractResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_contract function");
    debug!(
        "Creating contract for resident {} ({} / {})",
        request.resident_id, request.funding_source, request.drawdown_rate
    );

    let Some(funding_source) = parse_funding_source(&request.funding_source) else {
        warn!("Unknown funding source: {}", request.funding_source);
        return Err(bad_request(
            format!("Unknown funding source: {}", request.funding_source),
            "INVALID_FUNDING_SOURCE",
        ));
    };
    let Some(drawdown_rate) = parse_drawdown_rate(&request.drawdown_rate) else {
        warn!("Unknown drawdown rate: {}", request.drawdown_rate);
        return Err(bad_request(
            format!("Unknown drawdown rate: {}", request.drawdown_rate),
            "INVALID_DRAWDOWN_RATE",
        ));
    };
    if request.original_amount <= Decimal::ZERO {
        return Err(bad_request(
            "Original amount must be positive",
            "INVALID_AMOUNT",
        ));
    }

    let new_contract = funding_contract::ActiveModel {
        organization_id: Set(request.organization_id),
        resident_id: Set(request.resident_id),
        funding_source: Set(funding_source),
        original_amount: Set(request.original_amount),
        // The full allocation is available until drawn against.
        current_balance: Set(request.original_amount),
        drawdown_rate: Set(drawdown_rate),
        auto_drawdown: Set(request.auto_drawdown),
        daily_support_item_cost: Set(request.daily_support_item_cost),
        last_drawdown_date: Set(None),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        status: Set(ContractStatus::Draft),
        parent_contract_id: Set(request.parent_contract_id),
        ..Default::default()
    };

    match new_contract.insert(&state.db).await {
        Ok(model) => {
            info!("Contract created successfully with ID: {}", model.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    ContractResponse::from(model),
                    "Contract created successfully",
                )),
            ))
        }
        Err(db_error) => {
            error!(
                "Failed to create contract for resident {}: {}",
                request.resident_id, db_error
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create contract".to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}

/// Get all funding contracts
#[utoipa::path(
    get,
    path = "/api/v1/contracts",
    tag = "contracts",
    responses(
        (status = 200, description = "Contracts retrieved successfully", body = ApiResponse<Vec<ContractResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_contracts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ContractResponse>>>, StatusCode> {
    trace!("Entering get_contracts function");

    match funding_contract::Entity::find().all(&state.db).await {
        Ok(contracts) => {
            debug!("Retrieved {} contracts", contracts.len());
            let responses: Vec<ContractResponse> =
                contracts.into_iter().map(ContractResponse::from).collect();
            Ok(Json(ApiResponse::new(
                responses,
                "Contracts retrieved successfully",
            )))
        }
        Err(db_error) => {
            error!("Failed to retrieve contracts: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a single funding contract by ID
#[utoipa::path(
    get,
    path = "/api/v1/contracts/{id}",
    tag = "contracts",
    params(
        ("id" = i32, Path, description = "Contract ID")
    ),
    responses(
        (status = 200, description = "Contract retrieved successfully", body = ApiResponse<ContractResponse>),
        (status = 404, description = "Contract not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ContractResponse>>, StatusCode> {
    trace!("Entering get_contract function");

    match funding_contract::Entity::find_by_id(id).one(&state.db).await {
        Ok(Some(contract)) => Ok(Json(ApiResponse::new(
            ContractResponse::from(contract),
            "Contract retrieved successfully",
        ))),
        Ok(None) => {
            debug!("Contract {} not found", id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to retrieve contract {}: {}", id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Activate a draft contract, making it visible to the drawdown scheduler
#[utoipa::path(
    post,
    path = "/api/v1/contracts/{id}/activate",
    tag = "contracts",
    params(
        ("id" = i32, Path, description = "Contract ID")
    ),
    responses(
        (status = 200, description = "Contract activated successfully", body = ApiResponse<ContractResponse>),
        (status = 404, description = "Contract not found", body = ErrorResponse),
        (status = 409, description = "Contract is not in draft status", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn activate_contract(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ContractResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering activate_contract function");
    debug!("Activating contract {}", id);

    let contract = match funding_contract::Entity::find_by_id(id).one(&state.db).await {
        Ok(Some(contract)) => contract,
        Ok(None) => {
            debug!("Contract {} not found", id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Contract {id} not found"),
                    code: "CONTRACT_NOT_FOUND".to_string(),
                    success: false,
                }),
            ));
        }
        Err(db_error) => {
            error!("Failed to load contract {}: {}", id, db_error);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to load contract".to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                    success: false,
                }),
            ));
        }
    };

    if contract.status != ContractStatus::Draft {
        warn!(
            "Contract {} cannot be activated from status {:?}",
            id, contract.status
        );
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!("Contract {id} is not in draft status"),
                code: "INVALID_CONTRACT_STATUS".to_string(),
                success: false,
            }),
        ));
    }

    let mut active = contract.into_active_model();
    active.status = Set(ContractStatus::Active);
    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Contract {} activated", id);
            Ok(Json(ApiResponse::new(
                ContractResponse::from(updated),
                "Contract activated successfully",
            )))
        }
        Err(db_error) => {
            error!("Failed to activate contract {}: {}", id, db_error);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to activate contract".to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}
