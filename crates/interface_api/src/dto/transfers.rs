//! Transfer DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{ClassId, StaffId, StudentId};
use domain_transfer::{
    ApprovalOutcome, ClearanceInput, ClearanceStatus, Transfer, TransferRequest, TransferType,
    WaiverGrant,
};

#[derive(Debug, Deserialize)]
pub struct InitiateTransferRequest {
    pub student_id: Uuid,
    pub transfer_type: TransferType,
    pub reason: String,
    pub request_date: NaiveDate,
    pub destination_school: Option<String>,
    pub destination_school_code: Option<String>,
    pub destination_class_id: Option<Uuid>,
    pub destination_stream_id: Option<Uuid>,
    pub requested_by: Uuid,
}

impl InitiateTransferRequest {
    pub fn into_domain(self) -> (TransferRequest, StaffId) {
        let request = TransferRequest {
            student_id: StudentId::from(self.student_id),
            transfer_type: self.transfer_type,
            reason: self.reason,
            request_date: self.request_date,
            destination_school: self.destination_school,
            destination_school_code: self.destination_school_code,
            destination_class_id: self.destination_class_id.map(ClassId::from),
            destination_stream_id: self.destination_stream_id.map(core_kernel::StreamId::from),
        };
        (request, StaffId::from(self.requested_by))
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessClearanceRequest {
    pub status: Option<ClearanceStatus>,
    pub issue_description: Option<String>,
    pub resolution_notes: Option<String>,
    pub outstanding_amount: Option<Decimal>,
    pub waiver_reason: Option<String>,
    pub actor: Uuid,
}

impl ProcessClearanceRequest {
    pub fn into_domain(self) -> (ClearanceInput, StaffId) {
        let input = ClearanceInput {
            status: self.status,
            issue_description: self.issue_description,
            resolution_notes: self.resolution_notes,
            outstanding_amount: self.outstanding_amount,
            waiver: self.waiver_reason.map(|reason| WaiverGrant { reason }),
        };
        (input, StaffId::from(self.actor))
    }
}

#[derive(Debug, Deserialize)]
pub struct WaiverRequest {
    pub reason: String,
    pub actor: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct FeeVerificationRequest {
    pub actor: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub outcome: ApprovalOutcome,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub actor: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DocumentsRequest {
    pub leaving_certificate_no: Option<String>,
    pub leaving_certificate_path: Option<String>,
    pub clearance_form_path: Option<String>,
    pub actor: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CompleteTransferRequest {
    pub effective_date: Option<NaiveDate>,
    pub actor: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CancelTransferRequest {
    pub reason: String,
    pub actor: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub id: Uuid,
    pub transfer_no: String,
    pub student_id: Uuid,
    pub transfer_type: TransferType,
    pub status: String,
    pub reason: String,
    pub request_date: NaiveDate,
    pub destination_school: Option<String>,
    pub leaving_certificate_no: Option<String>,
    pub rejection_reason: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Transfer> for TransferResponse {
    fn from(transfer: Transfer) -> Self {
        Self {
            id: transfer.id.into(),
            transfer_no: transfer.transfer_no,
            student_id: transfer.student_id.into(),
            transfer_type: transfer.transfer_type,
            status: transfer.status.to_string(),
            reason: transfer.reason,
            request_date: transfer.request_date,
            destination_school: transfer.destination_school,
            leaving_certificate_no: transfer.leaving_certificate_no,
            rejection_reason: transfer.rejection_reason,
            effective_date: transfer.effective_date,
            completed_at: transfer.completed_at,
            created_at: transfer.created_at,
        }
    }
}
