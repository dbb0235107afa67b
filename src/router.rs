use crate::handlers::{
    automation::{get_runs, trigger_run},
    claims::{
        create_claim, get_claim, get_claims, mark_claim_paid, record_claim_reconciliation,
        transition_claim_status,
    },
    contracts::{activate_contract, create_contract, get_contract, get_contracts},
    health::health_check,
    residents::{create_resident, get_residents},
    transactions::{create_transaction, get_transactions},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Resident routes
        .route("/api/v1/residents", post(create_resident))
        .route("/api/v1/residents", get(get_residents))
        // Funding contract routes
        .route("/api/v1/contracts", post(create_contract))
        .route("/api/v1/contracts", get(get_contracts))
        .route("/api/v1/contracts/:id", get(get_contract))
        .route("/api/v1/contracts/:id/activate", post(activate_contract))
        // Billing transaction routes
        .route("/api/v1/transactions", post(create_transaction))
        .route("/api/v1/transactions", get(get_transactions))
        // Claim routes
        .route("/api/v1/claims", post(create_claim))
        .route("/api/v1/claims", get(get_claims))
        .route("/api/v1/claims/:id", get(get_claim))
        .route("/api/v1/claims/:id/status", post(transition_claim_status))
        .route(
            "/api/v1/claims/:id/reconciliations",
            post(record_claim_reconciliation),
        )
        .route("/api/v1/claims/:id/mark-paid", post(mark_claim_paid))
        // Automation routes
        .route("/api/v1/automation/run", post(trigger_run))
        .route("/api/v1/automation/runs", get(get_runs))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
