//! Re-admission DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{ClassId, GuardianId, StaffId, StreamId, StudentId};
use domain_readmission::{
    FeeWaiver, ReAdmission, ReAdmissionDecision, ReAdmissionOutcome, ReAdmissionRequest,
};

#[derive(Debug, Deserialize)]
pub struct SubmitReAdmissionRequest {
    pub student_id: Uuid,
    pub target_class_id: Uuid,
    pub target_stream_id: Uuid,
    pub readmission_date: NaiveDate,
    pub reason: String,
    pub exit_date: Option<NaiveDate>,
    pub exit_reason: Option<String>,
    pub guardian_id: Option<Uuid>,
    pub requested_by: Uuid,
}

impl SubmitReAdmissionRequest {
    pub fn into_domain(self) -> (ReAdmissionRequest, StaffId) {
        let request = ReAdmissionRequest {
            student_id: StudentId::from(self.student_id),
            target_class_id: ClassId::from(self.target_class_id),
            target_stream_id: StreamId::from(self.target_stream_id),
            readmission_date: self.readmission_date,
            reason: self.reason,
            exit_date: self.exit_date,
            exit_reason: self.exit_reason,
            guardian_id: self.guardian_id.map(GuardianId::from),
        };
        (request, StaffId::from(self.requested_by))
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub notes: Option<String>,
    pub actor: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ReAdmissionDecisionRequest {
    pub outcome: ReAdmissionOutcome,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub fee_waiver_amount: Option<Decimal>,
    pub fee_waiver_reason: Option<String>,
    pub actor: Uuid,
}

impl ReAdmissionDecisionRequest {
    pub fn into_domain(self) -> (ReAdmissionDecision, StaffId) {
        let fee_waiver = match (self.fee_waiver_amount, self.fee_waiver_reason) {
            (Some(amount), Some(reason)) => Some(FeeWaiver { amount, reason }),
            _ => None,
        };
        let decision = ReAdmissionDecision {
            outcome: self.outcome,
            notes: self.notes,
            rejection_reason: self.rejection_reason,
            fee_waiver,
        };
        (decision, StaffId::from(self.actor))
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteReAdmissionRequest {
    pub actor: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ReAdmissionResponse {
    pub id: Uuid,
    pub readmission_no: String,
    pub student_id: Uuid,
    pub status: String,
    pub previous_status: String,
    pub target_class_id: Uuid,
    pub target_stream_id: Uuid,
    pub readmission_date: NaiveDate,
    pub reason: String,
    pub previous_fee_balance: Decimal,
    pub fee_waiver_granted: bool,
    pub fee_waiver_amount: Option<Decimal>,
    pub rejection_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ReAdmission> for ReAdmissionResponse {
    fn from(readmission: ReAdmission) -> Self {
        Self {
            id: readmission.id.into(),
            readmission_no: readmission.readmission_no,
            student_id: readmission.student_id.into(),
            status: readmission.status.to_string(),
            previous_status: readmission.previous_status.to_string(),
            target_class_id: readmission.target_class_id.into(),
            target_stream_id: readmission.target_stream_id.into(),
            readmission_date: readmission.readmission_date,
            reason: readmission.reason,
            previous_fee_balance: readmission.previous_fee_balance,
            fee_waiver_granted: readmission.fee_waiver_granted,
            fee_waiver_amount: readmission.fee_waiver_amount,
            rejection_reason: readmission.rejection_reason,
            completed_at: readmission.completed_at,
            created_at: readmission.created_at,
        }
    }
}
