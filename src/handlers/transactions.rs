use crate::schemas::{engine_error_response, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use engine::identifier::{self, TRANSACTION_PREFIX};
use model::entities::billing_transaction::{self, TransactionSource, TransactionStatus};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for recording a manual billing transaction
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub organization_id: i32,
    pub resident_id: i32,
    pub contract_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub occurred_at: NaiveDateTime,
    pub service_code: String,
}

/// Query parameters for listing billing transactions
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransactionsQuery {
    /// One of: draft, picked_up, paid, rejected, cancelled
    pub status: Option<String>,
    pub claim_id: Option<i32>,
}

/// Billing transaction response model
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    pub transaction_number: String,
    pub organization_id: i32,
    pub resident_id: i32,
    pub contract_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub occurred_at: NaiveDateTime,
    pub service_code: String,
    pub status: String,
    pub claim_id: Option<i32>,
    pub source: String,
}

impl From<billing_transaction::Model> for TransactionResponse {
    fn from(model: billing_transaction::Model) -> Self {
        Self {
            id: model.id,
            transaction_number: model.transaction_number,
            organization_id: model.organization_id,
            resident_id: model.resident_id,
            contract_id: model.contract_id,
            amount: model.amount,
            occurred_at: model.occurred_at,
            service_code: model.service_code,
            status: match model.status {
                TransactionStatus::Draft => "draft".to_string(),
                TransactionStatus::PickedUp => "picked_up".to_string(),
                TransactionStatus::Paid => "paid".to_string(),
                TransactionStatus::Rejected => "rejected".to_string(),
                TransactionStatus::Cancelled => "cancelled".to_string(),
            },
            claim_id: model.claim_id,
            source: match model.source {
                TransactionSource::Manual => "manual".to_string(),
                TransactionSource::AutoDrawdown => "auto_drawdown".to_string(),
            },
        }
    }
}

fn parse_transaction_status(value: &str) -> Option<TransactionStatus> {
    match value {
        "draft" => Some(TransactionStatus::Draft),
        "picked_up" => Some(TransactionStatus::PickedUp),
        "paid" => Some(TransactionStatus::Paid),
        "rejected" => Some(TransactionStatus::Rejected),
        "cancelled" => Some(TransactionStatus::Cancelled),
        _ => None,
    }
}

/// Record a manual billing transaction in draft status
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = ApiResponse<TransactionResponse>),
        (status = 400, description = "Invalid transaction amount", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering create_transaction function");
    debug!(
        "Creating manual transaction of {} against contract {}",
        request.amount, request.contract_id
    );

    if request.amount <= Decimal::ZERO {
        warn!("Rejected non-positive transaction amount {}", request.amount);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Transaction amount must be positive".to_string(),
                code: "INVALID_AMOUNT".to_string(),
                success: false,
            }),
        ));
    }

    let db = &state.db;
    let organization_id = request.organization_id;
    let resident_id = request.resident_id;
    let contract_id = request.contract_id;
    let amount = request.amount;
    let occurred_at = request.occurred_at;
    let service_code = request.service_code.as_str();

    let result = identifier::with_allocation_retry(TRANSACTION_PREFIX, move || async move {
        let number = identifier::next_transaction_number(db).await?;
        let inserted = billing_transaction::ActiveModel {
            transaction_number: Set(number),
            organization_id: Set(organization_id),
            resident_id: Set(resident_id),
            contract_id: Set(contract_id),
            amount: Set(amount),
            occurred_at: Set(occurred_at),
            service_code: Set(service_code.to_string()),
            status: Set(TransactionStatus::Draft),
            claim_id: Set(None),
            source: Set(TransactionSource::Manual),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(inserted)
    })
    .await;

    match result {
        Ok(model) => {
            info!(
                "Transaction {} created with ID: {}",
                model.transaction_number, model.id
            );
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    TransactionResponse::from(model),
                    "Transaction created successfully",
                )),
            ))
        }
        Err(err) => {
            error!(
                "Failed to create transaction against contract {}: {}",
                request.contract_id, err
            );
            Err(engine_error_response(err))
        }
    }
}

/// List billing transactions, optionally filtered by status or claim
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "transactions",
    params(
        ("status" = Option<String>, Query, description = "Filter by transaction status"),
        ("claim_id" = Option<i32>, Query, description = "Filter by linked claim")
    ),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_transactions function");

    let mut select = billing_transaction::Entity::find()
        .order_by_asc(billing_transaction::Column::Id);
    if let Some(status) = &query.status {
        let Some(status) = parse_transaction_status(status) else {
            warn!("Unknown transaction status filter: {}", status);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Unknown transaction status: {status}"),
                    code: "INVALID_STATUS".to_string(),
                    success: false,
                }),
            ));
        };
        select = select.filter(billing_transaction::Column::Status.eq(status));
    }
    if let Some(claim_id) = query.claim_id {
        select = select.filter(billing_transaction::Column::ClaimId.eq(claim_id));
    }

    match select.all(&state.db).await {
        Ok(transactions) => {
            debug!("Retrieved {} transactions", transactions.len());
            let responses: Vec<TransactionResponse> = transactions
                .into_iter()
                .map(TransactionResponse::from)
                .collect();
            Ok(Json(ApiResponse::new(
                responses,
                "Transactions retrieved successfully",
            )))
        }
        Err(db_error) => {
            error!("Failed to retrieve transactions: {}", db_error);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to retrieve transactions".to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}
