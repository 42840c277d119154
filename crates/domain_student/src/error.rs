//! Student domain errors

use thiserror::Error;

/// Errors that can occur in the student domain
#[derive(Debug, Error)]
pub enum StudentError {
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Student is not eligible: {0}")]
    NotEligible(String),

    #[error("Enrollment already {0}")]
    EnrollmentAlreadyProcessed(String),

    #[error("Unknown status value: {0}")]
    UnknownStatus(String),
}
