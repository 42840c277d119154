//! HTTP API Layer
//!
//! This crate provides the REST API for the student lifecycle system using
//! Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per workflow
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses with workflow-aware
//!   status codes (404 not found, 409 state conflicts, 422 validation)
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{build_state, create_router};
//!
//! let app = create_router(build_state(pool, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::CheckRegistry;
use domain_promotion::PromotionEngine;
use domain_readmission::ReAdmissionEngine;
use domain_transfer::TransferWorkflowEngine;
use infra_db::{
    FinanceFeeCheck, LibraryLoanCheck, PostgresAcademicCalendar, PostgresNumberGenerator,
    PostgresPromotionStore, PostgresReAdmissionStore, PostgresTransferStore,
};

use crate::config::ApiConfig;
use crate::handlers::{health, promotions, readmissions, transfers};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub transfers: Arc<TransferWorkflowEngine>,
    pub readmissions: Arc<ReAdmissionEngine>,
    pub promotions: Arc<PromotionEngine>,
    pub pool: PgPool,
    pub config: ApiConfig,
}

/// Wires the workflow engines over the PostgreSQL adapters
///
/// The FINANCE and LIBRARY department checks are registered here; departments
/// without a registered check fall back to manual verification.
pub fn build_state(pool: PgPool, config: ApiConfig) -> AppState {
    let fee_check = Arc::new(FinanceFeeCheck::new(pool.clone()));

    let mut registry = CheckRegistry::new();
    registry.register("FINANCE", fee_check.clone());
    registry.register("LIBRARY", Arc::new(LibraryLoanCheck::new(pool.clone())));

    let numbers = Arc::new(PostgresNumberGenerator::new(pool.clone()));

    let transfers = Arc::new(TransferWorkflowEngine::new(
        Arc::new(PostgresTransferStore::new(pool.clone())),
        Arc::new(registry),
        numbers.clone(),
        fee_check,
    ));
    let readmissions = Arc::new(ReAdmissionEngine::new(
        Arc::new(PostgresReAdmissionStore::new(pool.clone())),
        numbers,
    ));
    let promotions = Arc::new(PromotionEngine::new(
        Arc::new(PostgresPromotionStore::new(pool.clone())),
        Arc::new(PostgresAcademicCalendar::new(pool.clone())),
    ));

    AppState {
        transfers,
        readmissions,
        promotions,
        pool,
        config,
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no workflow state involved)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Transfer workflow routes
    let transfer_routes = Router::new()
        .route("/", post(transfers::initiate_transfer))
        .route("/:id", get(transfers::get_transfer))
        .route("/:id/clearances", get(transfers::clearance_status))
        .route("/:id/clearances/:code", put(transfers::process_clearance))
        .route("/:id/clearances/:code/waiver", post(transfers::grant_waiver))
        .route("/:id/fees/verification", post(transfers::verify_fees))
        .route("/:id/approval", post(transfers::approve_transfer))
        .route("/:id/documents", post(transfers::mark_documents_ready))
        .route("/:id/completion", post(transfers::complete_transfer))
        .route("/:id/cancellation", post(transfers::cancel_transfer));

    // Re-admission workflow routes
    let readmission_routes = Router::new()
        .route("/", post(readmissions::submit_readmission))
        .route("/:id", get(readmissions::get_readmission))
        .route("/:id/review", post(readmissions::review_readmission))
        .route("/:id/decision", post(readmissions::decide_readmission))
        .route("/:id/completion", post(readmissions::complete_readmission));

    // Promotion and graduation routes
    let promotion_routes = Router::new()
        .route("/student", post(promotions::promote_student))
        .route("/students", post(promotions::promote_students))
        .route("/class", post(promotions::promote_class))
        .route("/school", post(promotions::promote_school))
        .route("/graduation", post(promotions::graduate_class));

    let api_routes = Router::new()
        .nest("/transfers", transfer_routes)
        .nest("/readmissions", readmission_routes)
        .nest("/promotions", promotion_routes)
        .route("/students/:id/screening", get(transfers::screen_student));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
