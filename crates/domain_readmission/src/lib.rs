//! Re-Admission Domain
//!
//! Brings previously exited students (transferred, graduated, suspended,
//! inactive) back onto the roll through a four-stage review workflow:
//! submission, document verification, the approval decision, and completion,
//! which reactivates the student record.

pub mod readmission;
pub mod engine;
pub mod ports;
pub mod error;

pub use readmission::{FeeWaiver, ReAdmission, ReAdmissionRequest, ReAdmissionStatus};
pub use engine::{ReAdmissionDecision, ReAdmissionEngine, ReAdmissionOutcome};
pub use ports::ReAdmissionStore;
pub use error::ReAdmissionError;
