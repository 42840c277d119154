//! Re-admission aggregate

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClassId, GuardianId, ReAdmissionId, StaffId, StreamId, StudentId};
use domain_student::{Student, StudentStatus};

use crate::error::ReAdmissionError;

/// Re-admission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReAdmissionStatus {
    /// Submitted, awaiting the initial review
    PendingReview,
    /// Documents under verification
    DocumentsVerification,
    /// Approved, student not yet reactivated
    Approved,
    /// Declined during verification
    Rejected,
    /// Student reactivated
    Completed,
}

impl ReAdmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReAdmissionStatus::PendingReview => "pending_review",
            ReAdmissionStatus::DocumentsVerification => "documents_verification",
            ReAdmissionStatus::Approved => "approved",
            ReAdmissionStatus::Rejected => "rejected",
            ReAdmissionStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReAdmissionStatus::Rejected | ReAdmissionStatus::Completed
        )
    }

    /// An open re-admission blocks new submissions for the student
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for ReAdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReAdmissionStatus {
    type Err = ReAdmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_review" => Ok(ReAdmissionStatus::PendingReview),
            "documents_verification" => Ok(ReAdmissionStatus::DocumentsVerification),
            "approved" => Ok(ReAdmissionStatus::Approved),
            "rejected" => Ok(ReAdmissionStatus::Rejected),
            "completed" => Ok(ReAdmissionStatus::Completed),
            other => Err(ReAdmissionError::UnknownStatus(other.to_string())),
        }
    }
}

/// Request payload for submitting a re-admission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReAdmissionRequest {
    pub student_id: StudentId,
    /// Class the student re-enters on completion
    pub target_class_id: ClassId,
    /// Stream the student re-enters on completion
    pub target_stream_id: StreamId,
    pub readmission_date: NaiveDate,
    pub reason: String,
    /// Date the student originally left, if known
    pub exit_date: Option<NaiveDate>,
    /// Why the student originally left
    pub exit_reason: Option<String>,
    /// Guardian lodging the request
    pub guardian_id: Option<GuardianId>,
}

/// Fee waiver recorded with an approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeWaiver {
    pub amount: Decimal,
    pub reason: String,
}

/// One re-entry attempt for a previously exited student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReAdmission {
    pub id: ReAdmissionId,
    /// Human-readable re-admission number
    pub readmission_no: String,
    pub student_id: StudentId,
    /// Student status at submission time
    pub previous_status: StudentStatus,
    /// Class held before exit, snapshotted at submission
    pub previous_class_id: Option<ClassId>,
    /// Stream held before exit, snapshotted at submission
    pub previous_stream_id: Option<StreamId>,
    pub exit_date: Option<NaiveDate>,
    pub exit_reason: Option<String>,
    pub target_class_id: ClassId,
    pub target_stream_id: StreamId,
    pub readmission_date: NaiveDate,
    pub reason: String,
    pub guardian_id: Option<GuardianId>,
    /// Outstanding balance at submission time; informational, not a guard
    pub previous_fee_balance: Decimal,
    pub status: ReAdmissionStatus,
    pub reviewed_by: Option<StaffId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub approved_by: Option<StaffId>,
    pub approval_date: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub fee_waiver_granted: bool,
    pub fee_waiver_amount: Option<Decimal>,
    pub fee_waiver_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReAdmission {
    /// Creates a submission for an exited student
    ///
    /// The student's current status must be one that admits re-entry; an
    /// active student has nothing to be re-admitted to.
    pub fn submit(
        request: ReAdmissionRequest,
        student: &Student,
        readmission_no: String,
        previous_fee_balance: Decimal,
    ) -> Result<Self, ReAdmissionError> {
        if !student.status.eligible_for_readmission() {
            return Err(ReAdmissionError::NotEligible(student.status.to_string()));
        }
        if request.reason.trim().is_empty() {
            return Err(ReAdmissionError::validation(
                "Re-admission reason is required",
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: ReAdmissionId::new_v7(),
            readmission_no,
            student_id: student.id,
            previous_status: student.status,
            previous_class_id: student.class_id,
            previous_stream_id: student.stream_id,
            exit_date: request.exit_date,
            exit_reason: request.exit_reason,
            target_class_id: request.target_class_id,
            target_stream_id: request.target_stream_id,
            readmission_date: request.readmission_date,
            reason: request.reason,
            guardian_id: request.guardian_id,
            previous_fee_balance,
            status: ReAdmissionStatus::PendingReview,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            approved_by: None,
            approval_date: None,
            approval_notes: None,
            rejection_reason: None,
            fee_waiver_granted: false,
            fee_waiver_amount: None,
            fee_waiver_reason: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates the status
    pub fn update_status(&mut self, status: ReAdmissionStatus) -> Result<(), ReAdmissionError> {
        if !self.can_transition_to(status) {
            return Err(ReAdmissionError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records the initial review, moving the request into document verification
    pub fn review(&mut self, actor: StaffId, notes: Option<String>) -> Result<(), ReAdmissionError> {
        self.update_status(ReAdmissionStatus::DocumentsVerification)?;
        self.reviewed_by = Some(actor);
        self.reviewed_at = Some(Utc::now());
        self.review_notes = notes;
        Ok(())
    }

    /// Records an approval, optionally granting a fee waiver
    pub fn approve(
        &mut self,
        actor: StaffId,
        notes: Option<String>,
        fee_waiver: Option<FeeWaiver>,
    ) -> Result<(), ReAdmissionError> {
        self.update_status(ReAdmissionStatus::Approved)?;
        self.approved_by = Some(actor);
        self.approval_date = Some(Utc::now());
        self.approval_notes = notes;
        if let Some(waiver) = fee_waiver {
            self.fee_waiver_granted = true;
            self.fee_waiver_amount = Some(waiver.amount);
            self.fee_waiver_reason = Some(waiver.reason);
        }
        Ok(())
    }

    /// Records a rejection
    pub fn reject(
        &mut self,
        actor: StaffId,
        reason: String,
        notes: Option<String>,
    ) -> Result<(), ReAdmissionError> {
        self.update_status(ReAdmissionStatus::Rejected)?;
        self.approved_by = Some(actor);
        self.approval_date = Some(Utc::now());
        self.approval_notes = notes;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// Completes the re-admission
    pub fn complete(&mut self) -> Result<(), ReAdmissionError> {
        self.update_status(ReAdmissionStatus::Completed)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn can_transition_to(&self, target: ReAdmissionStatus) -> bool {
        use ReAdmissionStatus::*;
        matches!(
            (self.status, target),
            (PendingReview, DocumentsVerification)
                | (DocumentsVerification, Approved)
                | (DocumentsVerification, Rejected)
                | (Approved, Completed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_submission(status: StudentStatus) -> Result<ReAdmission, ReAdmissionError> {
        let mut student = Student::new("ADM-4001", "Amina", "Wanjiru");
        if status != StudentStatus::Active {
            student.update_status(status).unwrap();
        }
        ReAdmission::submit(
            ReAdmissionRequest {
                student_id: student.id,
                target_class_id: ClassId::new(),
                target_stream_id: StreamId::new(),
                readmission_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
                reason: "Family moved back to the area".to_string(),
                exit_date: Some(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()),
                exit_reason: Some("Family relocated".to_string()),
                guardian_id: None,
            },
            &student,
            "RADM-2026-0001".to_string(),
            dec!(1200.00),
        )
    }

    #[test]
    fn test_submit_snapshots_the_prior_state() {
        let readmission = create_test_submission(StudentStatus::Transferred).unwrap();
        assert_eq!(readmission.status, ReAdmissionStatus::PendingReview);
        assert_eq!(readmission.previous_status, StudentStatus::Transferred);
        assert_eq!(readmission.previous_fee_balance, dec!(1200.00));
    }

    #[test]
    fn test_active_student_is_not_eligible() {
        let result = create_test_submission(StudentStatus::Active);
        assert!(matches!(result, Err(ReAdmissionError::NotEligible(_))));
    }

    #[test]
    fn test_full_approval_path() {
        let mut readmission = create_test_submission(StudentStatus::Suspended).unwrap();
        let reviewer = StaffId::new();
        let approver = StaffId::new();

        readmission.review(reviewer, Some("Documents requested".to_string())).unwrap();
        assert_eq!(readmission.status, ReAdmissionStatus::DocumentsVerification);
        assert_eq!(readmission.reviewed_by, Some(reviewer));

        readmission
            .approve(
                approver,
                None,
                Some(FeeWaiver {
                    amount: dec!(600.00),
                    reason: "Hardship waiver".to_string(),
                }),
            )
            .unwrap();
        assert_eq!(readmission.status, ReAdmissionStatus::Approved);
        assert!(readmission.fee_waiver_granted);

        readmission.complete().unwrap();
        assert_eq!(readmission.status, ReAdmissionStatus::Completed);
        assert!(readmission.completed_at.is_some());
    }

    #[test]
    fn test_cannot_approve_before_review() {
        let mut readmission = create_test_submission(StudentStatus::Inactive).unwrap();
        let result = readmission.approve(StaffId::new(), None, None);
        assert!(matches!(
            result,
            Err(ReAdmissionError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_rejection_is_terminal() {
        let mut readmission = create_test_submission(StudentStatus::Transferred).unwrap();
        readmission.review(StaffId::new(), None).unwrap();
        readmission
            .reject(StaffId::new(), "Outstanding disciplinary case".to_string(), None)
            .unwrap();
        assert_eq!(readmission.status, ReAdmissionStatus::Rejected);
        assert!(readmission.status.is_terminal());
        assert!(readmission.complete().is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ReAdmissionStatus::PendingReview,
            ReAdmissionStatus::DocumentsVerification,
            ReAdmissionStatus::Approved,
            ReAdmissionStatus::Rejected,
            ReAdmissionStatus::Completed,
        ] {
            let parsed: ReAdmissionStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
