//! Transfer workflow engine
//!
//! Orchestrates the six-stage transfer workflow over a [`TransferStore`],
//! the department [`CheckRegistry`], and the reference number generator.
//! Every mutating operation takes the acting staff member explicitly;
//! there is no ambient user context.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{CheckRegistry, EligibilityCheck, ReferenceNumberGenerator, StaffId, StudentId, TransferId};

use crate::clearance::{ClearanceRecord, ClearanceStatus, ClearanceSummary};
use crate::error::TransferError;
use crate::ports::TransferStore;
use crate::transfer::{Transfer, TransferRequest, TransferStatus, TransferType};

/// Caller-supplied input for processing one department's clearance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearanceInput {
    /// Explicit status override; required for departments without an
    /// automated check (manual verification)
    pub status: Option<ClearanceStatus>,
    /// Issue description supplied by the reviewing officer
    pub issue_description: Option<String>,
    /// Notes on how an issue was resolved
    pub resolution_notes: Option<String>,
    /// Outstanding amount override
    pub outstanding_amount: Option<Decimal>,
    /// Waiver: forces the record to cleared regardless of the check result
    pub waiver: Option<WaiverGrant>,
}

/// A waiver grant for a clearance record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaiverGrant {
    pub reason: String,
}

/// Result of processing one department clearance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearanceDecision {
    pub record: ClearanceRecord,
    pub summary: ClearanceSummary,
    pub transfer_status: TransferStatus,
}

/// Approval decision outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved,
    Rejected,
}

/// The approval decision for a transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub outcome: ApprovalOutcome,
    pub notes: Option<String>,
    /// Required when rejecting
    pub rejection_reason: Option<String>,
}

/// Document details recorded when leaving papers are issued
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferDocuments {
    /// Certificate number; generated when absent
    pub leaving_certificate_no: Option<String>,
    pub leaving_certificate_path: Option<String>,
    pub clearance_form_path: Option<String>,
}

/// Result of a fee settlement verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSettlement {
    pub settled: bool,
    pub outstanding_amount: Decimal,
    pub description: Option<String>,
    pub transfer_status: TransferStatus,
}

/// Composite read view: transfer plus its clearance state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferDetails {
    pub transfer: Transfer,
    pub clearances: Vec<ClearanceRecord>,
    pub summary: ClearanceSummary,
}

/// Pure read of a transfer's clearance records and summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearanceReport {
    pub records: Vec<ClearanceRecord>,
    pub summary: ClearanceSummary,
}

/// Drives transfers through clearance, fee settlement, approval, and completion
pub struct TransferWorkflowEngine {
    store: Arc<dyn TransferStore>,
    checks: Arc<CheckRegistry>,
    numbers: Arc<dyn ReferenceNumberGenerator>,
    fee_check: Arc<dyn EligibilityCheck>,
}

impl TransferWorkflowEngine {
    pub fn new(
        store: Arc<dyn TransferStore>,
        checks: Arc<CheckRegistry>,
        numbers: Arc<dyn ReferenceNumberGenerator>,
        fee_check: Arc<dyn EligibilityCheck>,
    ) -> Self {
        Self {
            store,
            checks,
            numbers,
            fee_check,
        }
    }

    /// Initiates a transfer and opens clearance records for every active
    /// mandatory department, all in one atomic store call
    #[instrument(skip(self, request), fields(student_id = %request.student_id, transfer_type = %request.transfer_type))]
    pub async fn initiate_transfer(
        &self,
        request: TransferRequest,
        actor: StaffId,
    ) -> Result<Transfer, TransferError> {
        let student = self
            .store
            .get_student(request.student_id)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => TransferError::StudentNotFound(request.student_id.to_string()),
                e => TransferError::Store(e),
            })?;

        if student.status == domain_student::StudentStatus::Transferred {
            return Err(TransferError::validation(
                "Student has already transferred out",
            ));
        }

        if let Some(existing) = self.store.find_open_transfer(student.id).await? {
            return Err(TransferError::TransferInProgress(existing.transfer_no));
        }

        let transfer_no = self.numbers.transfer_number().await?;
        let transfer = Transfer::request(request, &student, transfer_no, actor)?;

        let clearances: Vec<ClearanceRecord> = self
            .store
            .active_departments()
            .await?
            .iter()
            .filter(|d| d.is_mandatory)
            .map(|d| ClearanceRecord::new_pending(transfer.id, d))
            .collect();

        self.store.insert_transfer(&transfer, &clearances).await?;

        info!(
            transfer_no = %transfer.transfer_no,
            clearances = clearances.len(),
            "Transfer initiated"
        );
        Ok(transfer)
    }

    /// Processes one department's clearance
    ///
    /// Runs the registered check when there is one; a department without a
    /// registered check requires the caller to supply an explicit status
    /// (manual verification). A waiver clears the record regardless. A check
    /// *error* is noted on the record, which stays pending, and the call
    /// still succeeds.
    #[instrument(skip(self, input), fields(transfer_id = %transfer_id, department = department_code))]
    pub async fn process_department_clearance(
        &self,
        transfer_id: TransferId,
        department_code: &str,
        input: ClearanceInput,
        actor: StaffId,
    ) -> Result<ClearanceDecision, TransferError> {
        let mut transfer = self.get_transfer(transfer_id).await?;
        if !matches!(
            transfer.status,
            TransferStatus::PendingClearance | TransferStatus::ClearanceInProgress
        ) {
            return Err(TransferError::wrong_stage(
                transfer.status,
                "pending_clearance or clearance_in_progress",
            ));
        }

        let department = self
            .store
            .department_by_code(department_code)
            .await?
            .ok_or_else(|| TransferError::DepartmentNotFound(department_code.to_string()))?;

        // Created lazily if initialization missed this department
        let mut record = match self
            .store
            .clearance_for_department(transfer.id, department.id)
            .await?
        {
            Some(record) => record,
            None => ClearanceRecord::new_pending(transfer.id, &department),
        };

        let mut check_outcome = None;
        if let Some(check) = self.checks.get(&department.code) {
            match check.check(transfer.student_id).await {
                Ok(outcome) => {
                    record.note_check_outcome(&outcome);
                    check_outcome = Some(outcome);
                }
                Err(e) => {
                    warn!(error = %e, "Clearance check failed; recording on the item");
                    record.note_check_error(format!("Automated check failed: {}", e));
                }
            }
        }

        if let Some(description) = input.issue_description {
            record.has_issues = true;
            record.issue_description = Some(description);
        }
        if let Some(amount) = input.outstanding_amount {
            record.outstanding_amount = amount;
        }

        if let Some(waiver) = input.waiver {
            record.grant_waiver(actor, waiver.reason);
        } else if let Some(status) = input.status {
            record.resolve(status, actor, input.resolution_notes);
        } else if let Some(outcome) = check_outcome {
            let status = if outcome.has_issues() {
                ClearanceStatus::Blocked
            } else {
                ClearanceStatus::Cleared
            };
            record.resolve(status, actor, input.resolution_notes);
        } else if !self.checks.is_registered(&department.code) {
            // Manual department with no explicit decision yet
            if record.issue_description.is_none() {
                record.issue_description = Some("Manual verification required".to_string());
            }
        }

        // Recompute the aggregate with the updated record included
        let mut records = self.store.clearances_for(transfer.id).await?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        let summary = ClearanceSummary::from_records(&records);

        let mut transfer_changed = false;
        if summary.all_cleared {
            transfer.update_status(TransferStatus::FeesPending)?;
            transfer_changed = true;
        } else if record.status == ClearanceStatus::Blocked
            && transfer.status == TransferStatus::PendingClearance
        {
            transfer.update_status(TransferStatus::ClearanceInProgress)?;
            transfer_changed = true;
        } else if !summary.has_blocks() && transfer.status == TransferStatus::ClearanceInProgress {
            transfer.update_status(TransferStatus::PendingClearance)?;
            transfer_changed = true;
        }

        self.store
            .save_clearance(&record, transfer_changed.then_some(&transfer))
            .await?;

        info!(
            status = %record.status,
            all_cleared = summary.all_cleared,
            transfer_status = %transfer.status,
            "Department clearance processed"
        );
        Ok(ClearanceDecision {
            record,
            summary,
            transfer_status: transfer.status,
        })
    }

    /// Grants a waiver for one department's clearance
    pub async fn grant_waiver(
        &self,
        transfer_id: TransferId,
        department_code: &str,
        reason: String,
        actor: StaffId,
    ) -> Result<ClearanceDecision, TransferError> {
        if reason.trim().is_empty() {
            return Err(TransferError::validation("Waiver reason is required"));
        }
        self.process_department_clearance(
            transfer_id,
            department_code,
            ClearanceInput {
                waiver: Some(WaiverGrant { reason }),
                ..Default::default()
            },
            actor,
        )
        .await
    }

    /// Verifies the student's fee settlement via the fee check capability
    ///
    /// A zero outstanding balance advances the transfer to pending approval;
    /// otherwise the status is unchanged and the balance is reported.
    #[instrument(skip(self), fields(transfer_id = %transfer_id))]
    pub async fn verify_fee_settlement(
        &self,
        transfer_id: TransferId,
        _actor: StaffId,
    ) -> Result<FeeSettlement, TransferError> {
        let mut transfer = self.get_transfer(transfer_id).await?;
        if transfer.status != TransferStatus::FeesPending {
            return Err(TransferError::wrong_stage(transfer.status, "fees_pending"));
        }

        let outcome = self
            .fee_check
            .check(transfer.student_id)
            .await
            .map_err(|e| TransferError::FeeCheckFailed(e.to_string()))?;

        if outcome.is_cleared {
            transfer.update_status(TransferStatus::PendingApproval)?;
            self.store.update_transfer(&transfer).await?;
            info!("Fees settled; transfer awaiting approval");
        } else {
            info!(outstanding = %outcome.outstanding_amount, "Fees not settled");
        }

        Ok(FeeSettlement {
            settled: outcome.is_cleared,
            outstanding_amount: outcome.outstanding_amount,
            description: outcome.description,
            transfer_status: transfer.status,
        })
    }

    /// Records the approval decision
    ///
    /// Approval lands the transfer on `documents_ready`; rejection is
    /// terminal and requires a reason.
    #[instrument(skip(self, decision), fields(transfer_id = %transfer_id))]
    pub async fn approve_transfer(
        &self,
        transfer_id: TransferId,
        decision: ApprovalDecision,
        actor: StaffId,
    ) -> Result<Transfer, TransferError> {
        let mut transfer = self.get_transfer(transfer_id).await?;
        if transfer.status != TransferStatus::PendingApproval {
            return Err(TransferError::wrong_stage(transfer.status, "pending_approval"));
        }

        match decision.outcome {
            ApprovalOutcome::Approved => {
                transfer.approve(actor, decision.notes)?;
                transfer.update_status(TransferStatus::DocumentsReady)?;
            }
            ApprovalOutcome::Rejected => {
                let reason = decision
                    .rejection_reason
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| TransferError::validation("Rejection reason is required"))?;
                transfer.reject(actor, reason, decision.notes)?;
            }
        }

        self.store.update_transfer(&transfer).await?;
        info!(status = %transfer.status, "Approval decision recorded");
        Ok(transfer)
    }

    /// Issues the leaving documents, generating a certificate number when absent
    #[instrument(skip(self, documents), fields(transfer_id = %transfer_id))]
    pub async fn mark_documents_ready(
        &self,
        transfer_id: TransferId,
        documents: TransferDocuments,
        _actor: StaffId,
    ) -> Result<Transfer, TransferError> {
        let mut transfer = self.get_transfer(transfer_id).await?;
        if !matches!(
            transfer.status,
            TransferStatus::Approved | TransferStatus::DocumentsReady
        ) {
            return Err(TransferError::wrong_stage(
                transfer.status,
                "approved or documents_ready",
            ));
        }

        let certificate_no = match documents
            .leaving_certificate_no
            .or_else(|| transfer.leaving_certificate_no.clone())
        {
            Some(no) => no,
            None => {
                self.numbers
                    .certificate_number(transfer.request_date.year())
                    .await?
            }
        };
        transfer.record_documents(
            certificate_no,
            documents.leaving_certificate_path,
            documents.clearance_form_path,
        );
        if transfer.status == TransferStatus::Approved {
            transfer.update_status(TransferStatus::DocumentsReady)?;
        }

        self.store.update_transfer(&transfer).await?;
        Ok(transfer)
    }

    /// Completes the transfer and updates the student record per type:
    /// external marks the student transferred, graduation marks them
    /// graduated, internal moves them to the destination class/stream.
    /// Transfer and student are persisted in one atomic store call.
    #[instrument(skip(self), fields(transfer_id = %transfer_id))]
    pub async fn complete_transfer(
        &self,
        transfer_id: TransferId,
        effective_date: Option<NaiveDate>,
        _actor: StaffId,
    ) -> Result<Transfer, TransferError> {
        let mut transfer = self.get_transfer(transfer_id).await?;
        if !matches!(
            transfer.status,
            TransferStatus::Approved | TransferStatus::DocumentsReady
        ) {
            return Err(TransferError::wrong_stage(
                transfer.status,
                "approved or documents_ready",
            ));
        }

        let mut student = self.store.get_student(transfer.student_id).await?;
        match transfer.transfer_type {
            TransferType::External => student.mark_transferred()?,
            TransferType::Graduation => student.mark_graduated()?,
            TransferType::Internal => {
                let class_id = transfer
                    .destination_class_id
                    .or(student.class_id)
                    .ok_or_else(|| {
                        TransferError::validation("Internal transfer has no destination class")
                    })?;
                let stream_id = transfer.destination_stream_id.ok_or_else(|| {
                    TransferError::validation("Internal transfer has no destination stream")
                })?;
                student.move_to_stream(class_id, stream_id)?;
            }
        }

        let effective = effective_date.unwrap_or_else(|| Utc::now().date_naive());
        transfer.complete(effective)?;

        self.store.complete_transfer(&transfer, &student).await?;
        info!(
            transfer_no = %transfer.transfer_no,
            student_status = %student.status,
            "Transfer completed"
        );
        Ok(transfer)
    }

    /// Cancels a transfer in any non-terminal status
    #[instrument(skip(self, reason), fields(transfer_id = %transfer_id))]
    pub async fn cancel_transfer(
        &self,
        transfer_id: TransferId,
        reason: String,
        _actor: StaffId,
    ) -> Result<Transfer, TransferError> {
        let mut transfer = self.get_transfer(transfer_id).await?;
        transfer.cancel(reason)?;
        self.store.update_transfer(&transfer).await?;
        info!("Transfer cancelled");
        Ok(transfer)
    }

    /// Read-only composite of a transfer and its clearance state
    pub async fn transfer_details(&self, transfer_id: TransferId) -> Result<TransferDetails, TransferError> {
        let transfer = self.get_transfer(transfer_id).await?;
        let clearances = self.store.clearances_for(transfer.id).await?;
        let summary = ClearanceSummary::from_records(&clearances);
        Ok(TransferDetails {
            transfer,
            clearances,
            summary,
        })
    }

    /// Pure read of the clearance records and their aggregate
    pub async fn clearance_status(&self, transfer_id: TransferId) -> Result<ClearanceReport, TransferError> {
        let transfer = self.get_transfer(transfer_id).await?;
        let records = self.store.clearances_for(transfer.id).await?;
        let summary = ClearanceSummary::from_records(&records);
        Ok(ClearanceReport { records, summary })
    }

    /// Runs every registered check against a student without touching any
    /// transfer, for pre-transfer screening
    pub async fn screen_student(&self, student_id: StudentId) -> Result<Vec<DepartmentScreening>, TransferError> {
        let student = self.store.get_student(student_id).await?;
        let mut results = Vec::new();
        for department in self.store.active_departments().await? {
            let screening = match self.checks.get(&department.code) {
                Some(check) => match check.check(student.id).await {
                    Ok(outcome) => DepartmentScreening {
                        department_code: department.code,
                        department_name: department.name,
                        is_mandatory: department.is_mandatory,
                        outcome: Some(outcome),
                        error: None,
                        manual_check_required: false,
                    },
                    Err(e) => DepartmentScreening {
                        department_code: department.code,
                        department_name: department.name,
                        is_mandatory: department.is_mandatory,
                        outcome: None,
                        error: Some(e.to_string()),
                        manual_check_required: false,
                    },
                },
                None => DepartmentScreening {
                    department_code: department.code,
                    department_name: department.name,
                    is_mandatory: department.is_mandatory,
                    outcome: None,
                    error: None,
                    manual_check_required: true,
                },
            };
            results.push(screening);
        }
        Ok(results)
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, TransferError> {
        self.store.get_transfer(id).await.map_err(|e| match e {
            e if e.is_not_found() => TransferError::TransferNotFound(id.to_string()),
            e => TransferError::Store(e),
        })
    }
}

/// One department's pre-transfer screening result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentScreening {
    pub department_code: String,
    pub department_name: String,
    pub is_mandatory: bool,
    pub outcome: Option<core_kernel::CheckOutcome>,
    pub error: Option<String>,
    pub manual_check_required: bool,
}
