//! Transfer workflow handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::{StaffId, StudentId, TransferId};
use domain_transfer::{
    ApprovalDecision, ClearanceDecision, ClearanceReport, DepartmentScreening, FeeSettlement,
    TransferDetails, TransferDocuments,
};

use crate::dto::transfers::*;
use crate::{error::ApiError, AppState};

/// Opens a new transfer and seeds its clearance records
pub async fn initiate_transfer(
    State(state): State<AppState>,
    Json(request): Json<InitiateTransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError> {
    let (request, actor) = request.into_domain();
    let transfer = state.transfers.initiate_transfer(request, actor).await?;
    Ok((StatusCode::CREATED, Json(transfer.into())))
}

/// Gets a transfer with its clearance records and summary
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransferDetails>, ApiError> {
    let details = state.transfers.transfer_details(TransferId::from(id)).await?;
    Ok(Json(details))
}

/// Current clearance state of a transfer
pub async fn clearance_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClearanceReport>, ApiError> {
    let report = state.transfers.clearance_status(TransferId::from(id)).await?;
    Ok(Json(report))
}

/// Processes one department's clearance
pub async fn process_clearance(
    State(state): State<AppState>,
    Path((id, code)): Path<(Uuid, String)>,
    Json(request): Json<ProcessClearanceRequest>,
) -> Result<Json<ClearanceDecision>, ApiError> {
    let (input, actor) = request.into_domain();
    let decision = state
        .transfers
        .process_department_clearance(TransferId::from(id), &code, input, actor)
        .await?;
    Ok(Json(decision))
}

/// Grants a waiver for a blocked department clearance
pub async fn grant_waiver(
    State(state): State<AppState>,
    Path((id, code)): Path<(Uuid, String)>,
    Json(request): Json<WaiverRequest>,
) -> Result<Json<ClearanceDecision>, ApiError> {
    let decision = state
        .transfers
        .grant_waiver(
            TransferId::from(id),
            &code,
            request.reason,
            StaffId::from(request.actor),
        )
        .await?;
    Ok(Json(decision))
}

/// Verifies the student's fee account is settled
pub async fn verify_fees(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FeeVerificationRequest>,
) -> Result<Json<FeeSettlement>, ApiError> {
    let settlement = state
        .transfers
        .verify_fee_settlement(TransferId::from(id), StaffId::from(request.actor))
        .await?;
    Ok(Json(settlement))
}

/// Records the approval decision
pub async fn approve_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApprovalRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let decision = ApprovalDecision {
        outcome: request.outcome,
        notes: request.notes,
        rejection_reason: request.rejection_reason,
    };
    let transfer = state
        .transfers
        .approve_transfer(TransferId::from(id), decision, StaffId::from(request.actor))
        .await?;
    Ok(Json(transfer.into()))
}

/// Records leaving documents, generating a certificate number when absent
pub async fn mark_documents_ready(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DocumentsRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let documents = TransferDocuments {
        leaving_certificate_no: request.leaving_certificate_no,
        leaving_certificate_path: request.leaving_certificate_path,
        clearance_form_path: request.clearance_form_path,
    };
    let transfer = state
        .transfers
        .mark_documents_ready(TransferId::from(id), documents, StaffId::from(request.actor))
        .await?;
    Ok(Json(transfer.into()))
}

/// Completes the transfer and applies the student's exit
pub async fn complete_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteTransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let transfer = state
        .transfers
        .complete_transfer(
            TransferId::from(id),
            request.effective_date,
            StaffId::from(request.actor),
        )
        .await?;
    Ok(Json(transfer.into()))
}

/// Cancels an open transfer
pub async fn cancel_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelTransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let transfer = state
        .transfers
        .cancel_transfer(TransferId::from(id), request.reason, StaffId::from(request.actor))
        .await?;
    Ok(Json(transfer.into()))
}

/// Pre-transfer screening: runs every registered check without opening a transfer
pub async fn screen_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DepartmentScreening>>, ApiError> {
    let results = state.transfers.screen_student(StudentId::from(id)).await?;
    Ok(Json(results))
}
