//! Re-admission workflow engine

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use core_kernel::{ReAdmissionId, ReferenceNumberGenerator, StaffId};

use crate::error::ReAdmissionError;
use crate::ports::ReAdmissionStore;
use crate::readmission::{FeeWaiver, ReAdmission, ReAdmissionRequest, ReAdmissionStatus};

/// Decision outcome at the approval stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReAdmissionOutcome {
    Approved,
    Rejected,
}

/// The approval decision for a re-admission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReAdmissionDecision {
    pub outcome: ReAdmissionOutcome,
    pub notes: Option<String>,
    /// Required when rejecting
    pub rejection_reason: Option<String>,
    /// Optional waiver of the carried balance, granted with an approval
    pub fee_waiver: Option<FeeWaiver>,
}

/// Drives re-admissions from submission through review to completion
pub struct ReAdmissionEngine {
    store: Arc<dyn ReAdmissionStore>,
    numbers: Arc<dyn ReferenceNumberGenerator>,
}

impl ReAdmissionEngine {
    pub fn new(store: Arc<dyn ReAdmissionStore>, numbers: Arc<dyn ReferenceNumberGenerator>) -> Self {
        Self { store, numbers }
    }

    /// Submits a re-admission for an exited student
    ///
    /// The outstanding balance from the prior enrollment is snapshotted on
    /// the record. It informs the review; it does not block submission.
    #[instrument(skip(self, request), fields(student_id = %request.student_id))]
    pub async fn submit_readmission(
        &self,
        request: ReAdmissionRequest,
        _actor: StaffId,
    ) -> Result<ReAdmission, ReAdmissionError> {
        let student = self
            .store
            .get_student(request.student_id)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => {
                    ReAdmissionError::StudentNotFound(request.student_id.to_string())
                }
                e => ReAdmissionError::Store(e),
            })?;

        if let Some(existing) = self.store.find_open_readmission(student.id).await? {
            return Err(ReAdmissionError::ReAdmissionInProgress(
                existing.readmission_no,
            ));
        }

        let balance = self.store.outstanding_balance(student.id).await?;
        let readmission_no = self.numbers.readmission_number().await?;
        let readmission = ReAdmission::submit(request, &student, readmission_no, balance)?;

        self.store.insert_readmission(&readmission).await?;
        info!(
            readmission_no = %readmission.readmission_no,
            previous_status = %readmission.previous_status,
            "Re-admission submitted"
        );
        Ok(readmission)
    }

    /// Records the initial review; the request moves into document verification
    #[instrument(skip(self, notes), fields(readmission_id = %readmission_id))]
    pub async fn review_readmission(
        &self,
        readmission_id: ReAdmissionId,
        notes: Option<String>,
        actor: StaffId,
    ) -> Result<ReAdmission, ReAdmissionError> {
        let mut readmission = self.get_readmission(readmission_id).await?;
        if readmission.status != ReAdmissionStatus::PendingReview {
            return Err(ReAdmissionError::wrong_stage(
                readmission.status,
                "pending_review",
            ));
        }
        readmission.review(actor, notes)?;
        self.store.update_readmission(&readmission).await?;
        info!("Re-admission reviewed");
        Ok(readmission)
    }

    /// Records the approval decision after document verification
    #[instrument(skip(self, decision), fields(readmission_id = %readmission_id))]
    pub async fn approve_readmission(
        &self,
        readmission_id: ReAdmissionId,
        decision: ReAdmissionDecision,
        actor: StaffId,
    ) -> Result<ReAdmission, ReAdmissionError> {
        let mut readmission = self.get_readmission(readmission_id).await?;
        if readmission.status != ReAdmissionStatus::DocumentsVerification {
            return Err(ReAdmissionError::wrong_stage(
                readmission.status,
                "documents_verification",
            ));
        }

        match decision.outcome {
            ReAdmissionOutcome::Approved => {
                readmission.approve(actor, decision.notes, decision.fee_waiver)?;
            }
            ReAdmissionOutcome::Rejected => {
                let reason = decision
                    .rejection_reason
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| {
                        ReAdmissionError::validation("Rejection reason is required")
                    })?;
                readmission.reject(actor, reason, decision.notes)?;
            }
        }

        self.store.update_readmission(&readmission).await?;
        info!(status = %readmission.status, "Approval decision recorded");
        Ok(readmission)
    }

    /// Completes an approved re-admission, reactivating the student into the
    /// target class and stream. Record and student are persisted in one
    /// atomic store call.
    #[instrument(skip(self), fields(readmission_id = %readmission_id))]
    pub async fn complete_readmission(
        &self,
        readmission_id: ReAdmissionId,
        _actor: StaffId,
    ) -> Result<ReAdmission, ReAdmissionError> {
        let mut readmission = self.get_readmission(readmission_id).await?;
        if readmission.status != ReAdmissionStatus::Approved {
            return Err(ReAdmissionError::wrong_stage(readmission.status, "approved"));
        }

        let mut student = self.store.get_student(readmission.student_id).await?;
        student.reactivate(readmission.target_class_id, readmission.target_stream_id)?;
        readmission.complete()?;

        self.store
            .complete_readmission(&readmission, &student)
            .await?;
        info!(
            readmission_no = %readmission.readmission_no,
            "Re-admission completed; student reactivated"
        );
        Ok(readmission)
    }

    /// Read-only view of a re-admission
    pub async fn readmission_details(
        &self,
        readmission_id: ReAdmissionId,
    ) -> Result<ReAdmission, ReAdmissionError> {
        self.get_readmission(readmission_id).await
    }

    async fn get_readmission(&self, id: ReAdmissionId) -> Result<ReAdmission, ReAdmissionError> {
        self.store.get_readmission(id).await.map_err(|e| match e {
            e if e.is_not_found() => ReAdmissionError::ReAdmissionNotFound(id.to_string()),
            e => ReAdmissionError::Store(e),
        })
    }
}
