//! Promotion and graduation handlers

use axum::{extract::State, Json};

use core_kernel::{ClassId, StaffId, StreamId, StudentId};
use domain_promotion::{BatchOutcome, BulkOutcome, GraduationOutcome};

use crate::dto::promotions::*;
use crate::{error::ApiError, AppState};

/// Promotes a single student outside any batch
pub async fn promote_student(
    State(state): State<AppState>,
    Json(request): Json<PromoteStudentRequest>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let enrollment = state
        .promotions
        .promote_student(
            StudentId::from(request.student_id),
            target(request.to_class_id, request.to_stream_id),
            year(request.from_year_id),
            year(request.to_year_id),
            request.remarks,
            StaffId::from(request.actor),
        )
        .await?;
    Ok(Json(enrollment.into()))
}

/// Promotes a caller-picked set of students as one batch
pub async fn promote_students(
    State(state): State<AppState>,
    Json(request): Json<PromoteStudentsRequest>,
) -> Result<Json<BatchOutcome>, ApiError> {
    let student_ids: Vec<StudentId> = request
        .student_ids
        .iter()
        .copied()
        .map(StudentId::from)
        .collect();
    let outcome = state
        .promotions
        .promote_students(
            &student_ids,
            target(request.to_class_id, request.to_stream_id),
            year(request.from_year_id),
            year(request.to_year_id),
            request.remarks,
            StaffId::from(request.actor),
        )
        .await?;
    Ok(Json(outcome))
}

/// Promotes every pending student of one class/stream
pub async fn promote_class(
    State(state): State<AppState>,
    Json(request): Json<PromoteClassRequest>,
) -> Result<Json<BatchOutcome>, ApiError> {
    let assignment = request.assignment();
    let outcome = state
        .promotions
        .promote_class(
            ClassId::from(request.from_class_id),
            StreamId::from(request.from_stream_id),
            target(request.to_class_id, request.to_stream_id),
            year(request.from_year_id),
            year(request.to_year_id),
            assignment,
            StaffId::from(request.actor),
        )
        .await?;
    Ok(Json(outcome))
}

/// Runs a whole-school promotion over a class mapping
pub async fn promote_school(
    State(state): State<AppState>,
    Json(request): Json<PromoteSchoolRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    let mappings = request
        .mappings
        .into_iter()
        .map(ClassMappingDto::into_domain)
        .collect();
    let outcome = state
        .promotions
        .promote_school(
            mappings,
            year(request.from_year_id),
            year(request.to_year_id),
            StaffId::from(request.actor),
        )
        .await?;
    Ok(Json(outcome))
}

/// Graduates a final-grade class into the alumni register
pub async fn graduate_class(
    State(state): State<AppState>,
    Json(request): Json<GraduateClassRequest>,
) -> Result<Json<GraduationOutcome>, ApiError> {
    let details = request.details_map();
    let outcome = state
        .promotions
        .graduate_class(
            ClassId::from(request.class_id),
            StreamId::from(request.stream_id),
            year(request.year_id),
            request.graduation_date,
            details,
            StaffId::from(request.actor),
        )
        .await?;
    Ok(Json(outcome))
}
