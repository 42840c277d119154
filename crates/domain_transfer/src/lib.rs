//! Transfer Domain
//!
//! Drives a student's exit (or internal move) through the six-stage transfer
//! workflow: clearance collection across departments, fee settlement,
//! approval, document issuance, and completion.

pub mod transfer;
pub mod clearance;
pub mod engine;
pub mod ports;
pub mod error;

pub use transfer::{Transfer, TransferStatus, TransferType, TransferRequest};
pub use clearance::{
    ClearanceDepartment, ClearanceRecord, ClearanceStatus, ClearanceSummary,
};
pub use engine::{
    TransferWorkflowEngine, ClearanceInput, WaiverGrant, ClearanceDecision,
    ApprovalDecision, ApprovalOutcome, TransferDocuments, FeeSettlement,
    TransferDetails, ClearanceReport, DepartmentScreening,
};
pub use ports::TransferStore;
pub use error::TransferError;
