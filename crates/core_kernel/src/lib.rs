//! Core Kernel - Foundational types and utilities for the school records system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Strongly-typed identifiers for students, transfers, enrollments, and staff
//! - The port error taxonomy and health-check abstractions
//! - Clearance check capabilities and their registry
//! - Reference number generation for transfers, re-admissions, and certificates

pub mod identifiers;
pub mod ports;
pub mod checks;
pub mod numbering;

pub use identifiers::{
    StudentId, StaffId, GuardianId,
    TransferId, ClearanceRecordId, DepartmentId,
    ReAdmissionId,
    EnrollmentId, PromotionBatchId, PromotionRecordId, AlumniId,
    AcademicYearId, ClassId, StreamId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use checks::{CheckOutcome, CheckError, EligibilityCheck, CheckRegistry};
pub use numbering::ReferenceNumberGenerator;
