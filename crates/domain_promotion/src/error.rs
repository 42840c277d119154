//! Promotion domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the promotion domain
#[derive(Debug, Error)]
pub enum PromotionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Student {0} has transferred out and cannot be promoted")]
    StudentTransferred(String),

    #[error("Student {student} has no enrollment for year {year}")]
    NotEnrolled { student: String, year: String },

    #[error("Destination class/stream does not exist")]
    UnknownClassStream,

    #[error("Class '{0}' is not a graduating class")]
    NotAGraduatingClass(String),

    #[error("Promotion batch not found: {0}")]
    BatchNotFound(String),

    #[error("Unknown status value: {0}")]
    UnknownStatus(String),

    #[error(transparent)]
    Student(#[from] domain_student::StudentError),

    #[error(transparent)]
    Store(#[from] PortError),
}

impl PromotionError {
    pub fn validation(message: impl Into<String>) -> Self {
        PromotionError::Validation(message.into())
    }
}
