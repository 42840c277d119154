//! Transfer domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the transfer domain
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Transfer is {status}; operation requires {required}")]
    WrongStage { status: String, required: String },

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Transfer not found: {0}")]
    TransferNotFound(String),

    #[error("Clearance department not found or inactive: {0}")]
    DepartmentNotFound(String),

    #[error("Student already has a transfer in progress: {0}")]
    TransferInProgress(String),

    #[error("Fee settlement check failed: {0}")]
    FeeCheckFailed(String),

    #[error("Unknown status value: {0}")]
    UnknownStatus(String),

    #[error(transparent)]
    Student(#[from] domain_student::StudentError),

    #[error(transparent)]
    Store(#[from] PortError),
}

impl TransferError {
    pub fn validation(message: impl Into<String>) -> Self {
        TransferError::Validation(message.into())
    }

    pub fn wrong_stage(status: impl ToString, required: impl Into<String>) -> Self {
        TransferError::WrongStage {
            status: status.to_string(),
            required: required.into(),
        }
    }
}
