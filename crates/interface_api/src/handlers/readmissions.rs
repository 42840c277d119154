//! Re-admission workflow handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::{ReAdmissionId, StaffId};

use crate::dto::readmissions::*;
use crate::{error::ApiError, AppState};

/// Submits a re-admission for an exited student
pub async fn submit_readmission(
    State(state): State<AppState>,
    Json(request): Json<SubmitReAdmissionRequest>,
) -> Result<(StatusCode, Json<ReAdmissionResponse>), ApiError> {
    let (request, actor) = request.into_domain();
    let readmission = state.readmissions.submit_readmission(request, actor).await?;
    Ok((StatusCode::CREATED, Json(readmission.into())))
}

/// Gets a re-admission by id
pub async fn get_readmission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReAdmissionResponse>, ApiError> {
    let readmission = state
        .readmissions
        .readmission_details(ReAdmissionId::from(id))
        .await?;
    Ok(Json(readmission.into()))
}

/// Records the initial review, moving the request into document verification
pub async fn review_readmission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReAdmissionResponse>, ApiError> {
    let readmission = state
        .readmissions
        .review_readmission(ReAdmissionId::from(id), request.notes, StaffId::from(request.actor))
        .await?;
    Ok(Json(readmission.into()))
}

/// Records the approval or rejection decision
pub async fn decide_readmission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReAdmissionDecisionRequest>,
) -> Result<Json<ReAdmissionResponse>, ApiError> {
    let (decision, actor) = request.into_domain();
    let readmission = state
        .readmissions
        .approve_readmission(ReAdmissionId::from(id), decision, actor)
        .await?;
    Ok(Json(readmission.into()))
}

/// Completes an approved re-admission, reactivating the student
pub async fn complete_readmission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteReAdmissionRequest>,
) -> Result<Json<ReAdmissionResponse>, ApiError> {
    let readmission = state
        .readmissions
        .complete_readmission(ReAdmissionId::from(id), StaffId::from(request.actor))
        .await?;
    Ok(Json(readmission.into()))
}
