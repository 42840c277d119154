//! Transfer aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClassId, StaffId, StreamId, StudentId, TransferId};
use domain_student::Student;

use crate::error::TransferError;

/// Kind of transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    /// Move to another stream or class within the school
    Internal,
    /// Move to another school
    External,
    /// Exit at the end of the final grade
    Graduation,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::Internal => "internal",
            TransferType::External => "external",
            TransferType::Graduation => "graduation",
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferType {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(TransferType::Internal),
            "external" => Ok(TransferType::External),
            "graduation" => Ok(TransferType::Graduation),
            other => Err(TransferError::UnknownStatus(other.to_string())),
        }
    }
}

/// Transfer status
///
/// The workflow moves strictly forward except for the clearance stages,
/// which oscillate while departments block and unblock the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Captured but not yet submitted into clearance
    Draft,
    /// Awaiting department clearances
    PendingClearance,
    /// At least one department has blocked the student
    ClearanceInProgress,
    /// All departments cleared; fee settlement outstanding
    FeesPending,
    /// Fees settled; awaiting the approval decision
    PendingApproval,
    /// Approved, documents not yet issued
    Approved,
    /// Leaving documents issued
    DocumentsReady,
    /// Declined at approval
    Rejected,
    /// Abandoned before completion
    Cancelled,
    /// Fully executed; student record updated
    Completed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Draft => "draft",
            TransferStatus::PendingClearance => "pending_clearance",
            TransferStatus::ClearanceInProgress => "clearance_in_progress",
            TransferStatus::FeesPending => "fees_pending",
            TransferStatus::PendingApproval => "pending_approval",
            TransferStatus::Approved => "approved",
            TransferStatus::DocumentsReady => "documents_ready",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Cancelled => "cancelled",
            TransferStatus::Completed => "completed",
        }
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Rejected | TransferStatus::Cancelled
        )
    }

    /// A transfer in any non-terminal status blocks new transfers for the student
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TransferStatus::Draft),
            "pending_clearance" => Ok(TransferStatus::PendingClearance),
            "clearance_in_progress" => Ok(TransferStatus::ClearanceInProgress),
            "fees_pending" => Ok(TransferStatus::FeesPending),
            "pending_approval" => Ok(TransferStatus::PendingApproval),
            "approved" => Ok(TransferStatus::Approved),
            "documents_ready" => Ok(TransferStatus::DocumentsReady),
            "rejected" => Ok(TransferStatus::Rejected),
            "cancelled" => Ok(TransferStatus::Cancelled),
            "completed" => Ok(TransferStatus::Completed),
            other => Err(TransferError::UnknownStatus(other.to_string())),
        }
    }
}

/// Request payload for initiating a transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub student_id: StudentId,
    pub transfer_type: TransferType,
    pub reason: String,
    pub request_date: NaiveDate,
    /// Destination school name (external transfers)
    pub destination_school: Option<String>,
    /// Destination school code, if known
    pub destination_school_code: Option<String>,
    /// Destination class (internal transfers; defaults to the current class)
    pub destination_class_id: Option<ClassId>,
    /// Destination stream (internal transfers)
    pub destination_stream_id: Option<StreamId>,
}

/// A transfer attempt for one student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique identifier
    pub id: TransferId,
    /// Human-readable transfer number
    pub transfer_no: String,
    /// The transferring student
    pub student_id: StudentId,
    /// Kind of transfer
    pub transfer_type: TransferType,
    /// Class the student holds at initiation
    pub from_class_id: Option<ClassId>,
    /// Stream the student holds at initiation
    pub from_stream_id: Option<StreamId>,
    /// Destination school (external)
    pub destination_school: Option<String>,
    /// Destination school code (external)
    pub destination_school_code: Option<String>,
    /// Destination class (internal)
    pub destination_class_id: Option<ClassId>,
    /// Destination stream (internal)
    pub destination_stream_id: Option<StreamId>,
    /// Stated reason for the transfer
    pub reason: String,
    /// Status
    pub status: TransferStatus,
    /// Staff member who initiated the transfer
    pub requested_by: StaffId,
    /// Date the request was lodged
    pub request_date: NaiveDate,
    /// Approver, once decided
    pub approved_by: Option<StaffId>,
    /// When the decision was made
    pub approval_date: Option<DateTime<Utc>>,
    /// Notes recorded with the decision
    pub approval_notes: Option<String>,
    /// Reason given for a rejection
    pub rejection_reason: Option<String>,
    /// Reason given for a cancellation
    pub cancellation_reason: Option<String>,
    /// Leaving certificate number, once issued
    pub leaving_certificate_no: Option<String>,
    /// Stored path of the leaving certificate document
    pub leaving_certificate_path: Option<String>,
    /// Stored path of the clearance form document
    pub clearance_form_path: Option<String>,
    /// Date the transfer takes effect
    pub effective_date: Option<NaiveDate>,
    /// When the transfer was completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    /// Creates a transfer from a request, entering clearance immediately
    ///
    /// Validates the type-specific destination fields before anything is
    /// allocated: external transfers need a destination school, internal
    /// ones a destination stream.
    pub fn request(
        request: TransferRequest,
        student: &Student,
        transfer_no: String,
        actor: StaffId,
    ) -> Result<Self, TransferError> {
        if request.reason.trim().is_empty() {
            return Err(TransferError::validation("Transfer reason is required"));
        }
        match request.transfer_type {
            TransferType::External => {
                if request
                    .destination_school
                    .as_deref()
                    .map_or(true, |s| s.trim().is_empty())
                {
                    return Err(TransferError::validation(
                        "External transfers require a destination school",
                    ));
                }
            }
            TransferType::Internal => {
                if request.destination_stream_id.is_none() {
                    return Err(TransferError::validation(
                        "Internal transfers require a destination stream",
                    ));
                }
            }
            TransferType::Graduation => {}
        }

        let now = Utc::now();
        Ok(Self {
            id: TransferId::new_v7(),
            transfer_no,
            student_id: student.id,
            transfer_type: request.transfer_type,
            from_class_id: student.class_id,
            from_stream_id: student.stream_id,
            destination_school: request.destination_school,
            destination_school_code: request.destination_school_code,
            destination_class_id: request.destination_class_id,
            destination_stream_id: request.destination_stream_id,
            reason: request.reason,
            status: TransferStatus::PendingClearance,
            requested_by: actor,
            request_date: request.request_date,
            approved_by: None,
            approval_date: None,
            approval_notes: None,
            rejection_reason: None,
            cancellation_reason: None,
            leaving_certificate_no: None,
            leaving_certificate_path: None,
            clearance_form_path: None,
            effective_date: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates the status
    pub fn update_status(&mut self, status: TransferStatus) -> Result<(), TransferError> {
        if !self.can_transition_to(status) {
            return Err(TransferError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records an approval
    pub fn approve(&mut self, actor: StaffId, notes: Option<String>) -> Result<(), TransferError> {
        self.update_status(TransferStatus::Approved)?;
        self.approved_by = Some(actor);
        self.approval_date = Some(Utc::now());
        self.approval_notes = notes;
        Ok(())
    }

    /// Records a rejection
    pub fn reject(
        &mut self,
        actor: StaffId,
        reason: String,
        notes: Option<String>,
    ) -> Result<(), TransferError> {
        self.update_status(TransferStatus::Rejected)?;
        self.approved_by = Some(actor);
        self.approval_date = Some(Utc::now());
        self.approval_notes = notes;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// Stores issued documents
    pub fn record_documents(
        &mut self,
        certificate_no: String,
        certificate_path: Option<String>,
        clearance_form_path: Option<String>,
    ) {
        self.leaving_certificate_no = Some(certificate_no);
        if certificate_path.is_some() {
            self.leaving_certificate_path = certificate_path;
        }
        if clearance_form_path.is_some() {
            self.clearance_form_path = clearance_form_path;
        }
        self.updated_at = Utc::now();
    }

    /// Completes the transfer with an effective date
    pub fn complete(&mut self, effective_date: NaiveDate) -> Result<(), TransferError> {
        self.update_status(TransferStatus::Completed)?;
        self.effective_date = Some(effective_date);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Cancels the transfer
    pub fn cancel(&mut self, reason: String) -> Result<(), TransferError> {
        self.update_status(TransferStatus::Cancelled)?;
        self.cancellation_reason = Some(reason);
        Ok(())
    }

    /// Checks if transition is valid
    fn can_transition_to(&self, target: TransferStatus) -> bool {
        use TransferStatus::*;
        if target == Cancelled {
            return !self.status.is_terminal();
        }
        matches!(
            (self.status, target),
            (Draft, PendingClearance)
                | (PendingClearance, ClearanceInProgress)
                | (PendingClearance, FeesPending)
                | (ClearanceInProgress, PendingClearance)
                | (ClearanceInProgress, FeesPending)
                | (FeesPending, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, Rejected)
                | (Approved, DocumentsReady)
                | (Approved, Completed)
                | (DocumentsReady, Completed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_student::Student;

    fn create_test_request(transfer_type: TransferType) -> TransferRequest {
        TransferRequest {
            student_id: StudentId::new(),
            transfer_type,
            reason: "Family relocating".to_string(),
            request_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            destination_school: Some("Hillside Academy".to_string()),
            destination_school_code: None,
            destination_class_id: None,
            destination_stream_id: None,
        }
    }

    fn create_test_transfer() -> Transfer {
        let student = Student::new("ADM-2001", "Amina", "Wanjiru");
        Transfer::request(
            create_test_request(TransferType::External),
            &student,
            "TRF-2026-00001".to_string(),
            StaffId::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_request_starts_in_pending_clearance() {
        let transfer = create_test_transfer();
        assert_eq!(transfer.status, TransferStatus::PendingClearance);
        assert!(transfer.status.is_open());
    }

    #[test]
    fn test_external_requires_destination_school() {
        let student = Student::new("ADM-2002", "Brian", "Otieno");
        let mut request = create_test_request(TransferType::External);
        request.destination_school = None;

        let result = Transfer::request(request, &student, "TRF-2026-00002".to_string(), StaffId::new());
        assert!(matches!(result, Err(TransferError::Validation(_))));
    }

    #[test]
    fn test_internal_requires_destination_stream() {
        let student = Student::new("ADM-2003", "Carol", "Mwangi");
        let mut request = create_test_request(TransferType::Internal);
        request.destination_stream_id = None;

        let result = Transfer::request(request, &student, "TRF-2026-00003".to_string(), StaffId::new());
        assert!(matches!(result, Err(TransferError::Validation(_))));
    }

    #[test]
    fn test_full_forward_path() {
        let mut transfer = create_test_transfer();
        transfer.update_status(TransferStatus::FeesPending).unwrap();
        transfer.update_status(TransferStatus::PendingApproval).unwrap();
        transfer.approve(StaffId::new(), None).unwrap();
        transfer.update_status(TransferStatus::DocumentsReady).unwrap();
        transfer
            .complete(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap())
            .unwrap();

        assert_eq!(transfer.status, TransferStatus::Completed);
        assert!(transfer.completed_at.is_some());
    }

    #[test]
    fn test_cannot_skip_to_approval() {
        let mut transfer = create_test_transfer();
        let result = transfer.update_status(TransferStatus::Approved);
        assert!(matches!(
            result,
            Err(TransferError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_cancel_from_any_open_status() {
        let mut transfer = create_test_transfer();
        transfer.update_status(TransferStatus::FeesPending).unwrap();
        transfer.cancel("Parent withdrew the request".to_string()).unwrap();
        assert_eq!(transfer.status, TransferStatus::Cancelled);

        // Terminal now; cancelling again is rejected
        let result = transfer.cancel("again".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_completed_transfer_cannot_be_cancelled() {
        let mut transfer = create_test_transfer();
        transfer.update_status(TransferStatus::FeesPending).unwrap();
        transfer.update_status(TransferStatus::PendingApproval).unwrap();
        transfer.approve(StaffId::new(), None).unwrap();
        transfer
            .complete(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap())
            .unwrap();

        assert!(transfer.cancel("too late".to_string()).is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TransferStatus::Draft,
            TransferStatus::PendingClearance,
            TransferStatus::ClearanceInProgress,
            TransferStatus::FeesPending,
            TransferStatus::PendingApproval,
            TransferStatus::Approved,
            TransferStatus::DocumentsReady,
            TransferStatus::Rejected,
            TransferStatus::Cancelled,
            TransferStatus::Completed,
        ] {
            let parsed: TransferStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
