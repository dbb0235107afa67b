use crate::schemas::{engine_error_response, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use common::RunOutcome;
use engine::notify::LogNotifier;
use engine::scheduler::run_billing_cycle;
use model::entities::automation_run;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace};
use utoipa::ToSchema;

/// Request body for triggering one billing cycle
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TriggerRunRequest {
    /// Organization to run the cycle for
    pub organization_id: i32,
    /// Bypass the run-window minute gate (operator-initiated runs). The
    /// once-per-day guard still applies.
    pub force: Option<bool>,
}

/// Query parameters for listing automation runs
#[derive(Debug, Deserialize, ToSchema)]
pub struct RunsQuery {
    pub organization_id: Option<i32>,
}

/// Automation run log entry response model
#[derive(Debug, Serialize, ToSchema)]
pub struct AutomationRunResponse {
    pub id: i32,
    pub organization_id: i32,
    pub run_date: NaiveDate,
    pub status: String,
    pub processed_contracts: i32,
    pub successful_transactions: i32,
    pub failed_transactions: i32,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub execution_time_ms: i64,
    pub errors_json: Option<String>,
    pub summary: String,
    pub created_at: NaiveDateTime,
}

impl From<automation_run::Model> for AutomationRunResponse {
    fn from(model: automation_run::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            run_date: model.run_date,
            status: match model.status {
                automation_run::AutomationRunStatus::Success => "success".to_string(),
                automation_run::AutomationRunStatus::Partial => "partial".to_string(),
                automation_run::AutomationRunStatus::Failed => "failed".to_string(),
            },
            processed_contracts: model.processed_contracts,
            successful_transactions: model.successful_transactions,
            failed_transactions: model.failed_transactions,
            total_amount: model.total_amount,
            execution_time_ms: model.execution_time_ms,
            errors_json: model.errors_json,
            summary: model.summary,
            created_at: model.created_at,
        }
    }
}

/// Trigger one invocation of the billing cycle
#[utoipa::path(
    post,
    path = "/api/v1/automation/run",
    tag = "automation",
    request_body = TriggerRunRequest,
    responses(
        (status = 200, description = "Cycle evaluated (completed, not due, or already ran)", body = ApiResponse<RunOutcome>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn trigger_run(
    State(state): State<AppState>,
    Json(request): Json<TriggerRunRequest>,
) -> Result<Json<ApiResponse<RunOutcome>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering trigger_run function");
    debug!(
        "Triggering billing cycle for organization {} (force: {:?})",
        request.organization_id, request.force
    );

    let notifier = LogNotifier;
    match run_billing_cycle(
        &state.db,
        request.organization_id,
        &state.automation,
        &notifier,
        Utc::now(),
        request.force.unwrap_or(false),
    )
    .await
    {
        Ok(outcome) => {
            let message = match &outcome {
                RunOutcome::NotDue => "Outside the configured run window",
                RunOutcome::AlreadyRan => "Billing cycle already ran today",
                RunOutcome::Completed { .. } => "Billing cycle completed",
            };
            info!(
                "Billing cycle for organization {} finished: {}",
                request.organization_id, message
            );
            Ok(Json(ApiResponse::new(outcome, message)))
        }
        Err(err) => {
            error!(
                "Billing cycle for organization {} failed: {}",
                request.organization_id, err
            );
            Err(engine_error_response(err))
        }
    }
}

/// List automation run log entries
#[utoipa::path(
    get,
    path = "/api/v1/automation/runs",
    tag = "automation",
    responses(
        (status = 200, description = "Runs retrieved successfully", body = ApiResponse<Vec<AutomationRunResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<AutomationRunResponse>>>, StatusCode> {
    trace!("Entering get_runs function");

    let mut select = automation_run::Entity::find()
        .order_by_desc(automation_run::Column::RunDate);
    if let Some(organization_id) = query.organization_id {
        select = select.filter(automation_run::Column::OrganizationId.eq(organization_id));
    }

    match select.all(&state.db).await {
        Ok(runs) => {
            debug!("Retrieved {} automation runs", runs.len());
            let responses: Vec<AutomationRunResponse> =
                runs.into_iter().map(AutomationRunResponse::from).collect();
            Ok(Json(ApiResponse::new(
                responses,
                "Automation runs retrieved successfully",
            )))
        }
        Err(db_error) => {
            error!("Failed to retrieve automation runs: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
