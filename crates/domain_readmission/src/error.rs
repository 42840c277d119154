//! Re-admission domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the re-admission domain
#[derive(Debug, Error)]
pub enum ReAdmissionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Re-admission is {status}; operation requires {required}")]
    WrongStage { status: String, required: String },

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Re-admission not found: {0}")]
    ReAdmissionNotFound(String),

    #[error("Student status '{0}' is not eligible for re-admission")]
    NotEligible(String),

    #[error("Student already has a re-admission in progress: {0}")]
    ReAdmissionInProgress(String),

    #[error("Unknown status value: {0}")]
    UnknownStatus(String),

    #[error(transparent)]
    Student(#[from] domain_student::StudentError),

    #[error(transparent)]
    Store(#[from] PortError),
}

impl ReAdmissionError {
    pub fn validation(message: impl Into<String>) -> Self {
        ReAdmissionError::Validation(message.into())
    }

    pub fn wrong_stage(status: impl ToString, required: impl Into<String>) -> Self {
        ReAdmissionError::WrongStage {
            status: status.to_string(),
            required: required.into(),
        }
    }
}
