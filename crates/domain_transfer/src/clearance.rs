//! Department clearance records and aggregation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CheckOutcome, ClearanceRecordId, DepartmentId, StaffId, TransferId};

use crate::error::TransferError;

/// A department that must sign off before a student leaves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearanceDepartment {
    pub id: DepartmentId,
    /// Short unique code, e.g. "FINANCE"
    pub code: String,
    /// Display name, e.g. "Finance Office"
    pub name: String,
    pub description: Option<String>,
    /// Mandatory departments gate the transfer; optional ones are advisory
    pub is_mandatory: bool,
    /// Processing order on the clearance form
    pub sort_order: i16,
    pub is_active: bool,
}

/// Status of a single department clearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceStatus {
    /// Not yet processed
    Pending,
    /// Department has signed off
    Cleared,
    /// Department is holding the student
    Blocked,
}

impl ClearanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearanceStatus::Pending => "pending",
            ClearanceStatus::Cleared => "cleared",
            ClearanceStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ClearanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClearanceStatus {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClearanceStatus::Pending),
            "cleared" => Ok(ClearanceStatus::Cleared),
            "blocked" => Ok(ClearanceStatus::Blocked),
            other => Err(TransferError::UnknownStatus(other.to_string())),
        }
    }
}

/// One department's clearance for one transfer
///
/// Uniquely keyed by (transfer, department).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearanceRecord {
    pub id: ClearanceRecordId,
    pub transfer_id: TransferId,
    pub department_id: DepartmentId,
    /// Department code, denormalised for display and registry lookup
    pub department_code: String,
    pub status: ClearanceStatus,
    /// Whether a check (or manual review) found issues
    pub has_issues: bool,
    /// What the issue is, when there is one
    pub issue_description: Option<String>,
    /// Amount owed to the department
    pub outstanding_amount: Decimal,
    /// How the issue was resolved
    pub resolution_notes: Option<String>,
    /// A waiver clears the record regardless of the check result
    pub waiver_granted: bool,
    pub waiver_reason: Option<String>,
    pub waiver_granted_by: Option<StaffId>,
    /// Staff member who cleared or blocked the record
    pub cleared_by: Option<StaffId>,
    pub cleared_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClearanceRecord {
    /// Creates a pending record for a department
    pub fn new_pending(transfer_id: TransferId, department: &ClearanceDepartment) -> Self {
        let now = Utc::now();
        Self {
            id: ClearanceRecordId::new_v7(),
            transfer_id,
            department_id: department.id,
            department_code: department.code.clone(),
            status: ClearanceStatus::Pending,
            has_issues: false,
            issue_description: None,
            outstanding_amount: Decimal::ZERO,
            resolution_notes: None,
            waiver_granted: false,
            waiver_reason: None,
            waiver_granted_by: None,
            cleared_by: None,
            cleared_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Records what an automated check found, without deciding the status
    pub fn note_check_outcome(&mut self, outcome: &CheckOutcome) {
        self.has_issues = outcome.has_issues();
        self.outstanding_amount = outcome.outstanding_amount;
        if outcome.description.is_some() {
            self.issue_description = outcome.description.clone();
        }
        self.updated_at = Utc::now();
    }

    /// Records a check failure as an issue note; the record stays pending
    pub fn note_check_error(&mut self, message: impl Into<String>) {
        self.has_issues = true;
        self.issue_description = Some(message.into());
        self.updated_at = Utc::now();
    }

    /// Settles the record into a status, stamping the actor
    pub fn resolve(&mut self, status: ClearanceStatus, actor: StaffId, notes: Option<String>) {
        let now = Utc::now();
        self.status = status;
        if notes.is_some() {
            self.resolution_notes = notes;
        }
        self.cleared_by = Some(actor);
        if status == ClearanceStatus::Cleared {
            self.cleared_at = Some(now);
        }
        self.updated_at = now;
    }

    /// Grants a waiver: the record becomes cleared no matter what the check said
    pub fn grant_waiver(&mut self, actor: StaffId, reason: String) {
        self.waiver_granted = true;
        self.waiver_reason = Some(reason);
        self.waiver_granted_by = Some(actor);
        self.resolve(ClearanceStatus::Cleared, actor, None);
    }
}

/// Aggregate view over a transfer's clearance records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceSummary {
    pub total: u32,
    pub cleared: u32,
    pub blocked: u32,
    pub pending: u32,
    /// True only when total > 0 and every record is cleared
    pub all_cleared: bool,
}

impl ClearanceSummary {
    /// Aggregates a set of clearance records
    pub fn from_records(records: &[ClearanceRecord]) -> Self {
        let total = records.len() as u32;
        let cleared = records
            .iter()
            .filter(|r| r.status == ClearanceStatus::Cleared)
            .count() as u32;
        let blocked = records
            .iter()
            .filter(|r| r.status == ClearanceStatus::Blocked)
            .count() as u32;
        let pending = total - cleared - blocked;
        Self {
            total,
            cleared,
            blocked,
            pending,
            all_cleared: total > 0 && cleared == total,
        }
    }

    pub fn has_blocks(&self) -> bool {
        self.blocked > 0
    }
}
