//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::PortError;
use domain_promotion::PromotionError;
use domain_readmission::ReAdmissionError;
use domain_transfer::TransferError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone()),
            ApiError::Database(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone()),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

fn from_port_error(e: PortError) -> ApiError {
    match &e {
        PortError::NotFound { .. } => ApiError::NotFound(e.to_string()),
        PortError::Conflict { .. } => ApiError::Conflict(e.to_string()),
        PortError::Validation { .. } => ApiError::Validation(e.to_string()),
        _ => ApiError::Database(e.to_string()),
    }
}

impl From<PortError> for ApiError {
    fn from(e: PortError) -> Self {
        from_port_error(e)
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Validation(_) | TransferError::UnknownStatus(_) => {
                ApiError::Validation(e.to_string())
            }
            TransferError::InvalidStatusTransition { .. }
            | TransferError::WrongStage { .. }
            | TransferError::TransferInProgress(_)
            | TransferError::Student(_) => ApiError::Conflict(e.to_string()),
            TransferError::StudentNotFound(_)
            | TransferError::TransferNotFound(_)
            | TransferError::DepartmentNotFound(_) => ApiError::NotFound(e.to_string()),
            TransferError::FeeCheckFailed(_) => ApiError::Internal(e.to_string()),
            TransferError::Store(inner) => from_port_error(inner),
        }
    }
}

impl From<ReAdmissionError> for ApiError {
    fn from(e: ReAdmissionError) -> Self {
        match e {
            ReAdmissionError::Validation(_)
            | ReAdmissionError::NotEligible(_)
            | ReAdmissionError::UnknownStatus(_) => ApiError::Validation(e.to_string()),
            ReAdmissionError::InvalidStatusTransition { .. }
            | ReAdmissionError::WrongStage { .. }
            | ReAdmissionError::ReAdmissionInProgress(_)
            | ReAdmissionError::Student(_) => ApiError::Conflict(e.to_string()),
            ReAdmissionError::StudentNotFound(_) | ReAdmissionError::ReAdmissionNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            ReAdmissionError::Store(inner) => from_port_error(inner),
        }
    }
}

impl From<PromotionError> for ApiError {
    fn from(e: PromotionError) -> Self {
        match e {
            PromotionError::Validation(_)
            | PromotionError::UnknownClassStream
            | PromotionError::NotAGraduatingClass(_)
            | PromotionError::UnknownStatus(_) => ApiError::Validation(e.to_string()),
            PromotionError::StudentTransferred(_)
            | PromotionError::NotEnrolled { .. }
            | PromotionError::Student(_) => ApiError::Conflict(e.to_string()),
            PromotionError::StudentNotFound(_) | PromotionError::BatchNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            PromotionError::Store(inner) => from_port_error(inner),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}
