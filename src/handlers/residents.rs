use crate::schemas::{ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::resident;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace};
use utoipa::ToSchema;

/// Request body for creating a new resident
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateResidentRequest {
    pub organization_id: i32,
    pub first_name: String,
    pub last_name: String,
    /// NDIS participant number, unique across the platform
    pub ndis_number: String,
}

/// Resident response model
#[derive(Debug, Serialize, ToSchema)]
pub struct ResidentResponse {
    pub id: i32,
    pub organization_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub ndis_number: String,
}

impl From<resident::Model> for ResidentResponse {
    fn from(model: resident::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            first_name: model.first_name,
            last_name: model.last_name,
            ndis_number: model.ndis_number,
        }
    }
}

/// Create a new resident
#[utoipa::path(
    post,
    path = "/api/v1/residents",
    tag = "residents",
    request_body = CreateResidentRequest,
    responses(
        (status = 201, description = "Resident created successfully", body = ApiResponse<ResidentResponse>),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_resident(
    State(state): State<AppState>,
    Json(request): Json<CreateResidentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ResidentResponse>>), StatusCode> {
    trace!("Entering create_resident function");
    debug!(
        "Creating resident {} {} (NDIS {})",
        request.first_name, request.last_name, request.ndis_number
    );

    let new_resident = resident::ActiveModel {
        organization_id: Set(request.organization_id),
        first_name: Set(request.first_name.clone()),
        last_name: Set(request.last_name.clone()),
        ndis_number: Set(request.ndis_number.clone()),
        ..Default::default()
    };

    match new_resident.insert(&state.db).await {
        Ok(model) => {
            info!("Resident created successfully with ID: {}", model.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    ResidentResponse::from(model),
                    "Resident created successfully",
                )),
            ))
        }
        Err(db_error) => {
            error!(
                "Failed to create resident with NDIS number {}: {}",
                request.ndis_number, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all residents
#[utoipa::path(
    get,
    path = "/api/v1/residents",
    tag = "residents",
    responses(
        (status = 200, description = "Residents retrieved successfully", body = ApiResponse<Vec<ResidentResponse>>),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_residents(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ResidentResponse>>>, StatusCode> {
    trace!("Entering get_residents function");

    match resident::Entity::find().all(&state.db).await {
        Ok(residents) => {
            debug!("Retrieved {} residents", residents.len());
            let responses: Vec<ResidentResponse> =
                residents.into_iter().map(ResidentResponse::from).collect();
            Ok(Json(ApiResponse::new(
                responses,
                "Residents retrieved successfully",
            )))
        }
        Err(db_error) => {
            error!("Failed to retrieve residents: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
