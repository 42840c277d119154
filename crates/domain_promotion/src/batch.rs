//! Promotion batches and per-student history records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    AcademicYearId, ClassId, EnrollmentId, PromotionBatchId, PromotionRecordId, StaffId, StudentId,
};

use crate::error::PromotionError;

/// Shape of a promotion batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionType {
    /// A caller-picked set of students
    MultipleStudents,
    /// Every pending student of one class/stream
    EntireClass,
    /// A whole-school run over a class mapping
    BulkSchool,
    /// Final-grade graduation into the alumni register
    Graduation,
}

impl PromotionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionType::MultipleStudents => "multiple_students",
            PromotionType::EntireClass => "entire_class",
            PromotionType::BulkSchool => "bulk_school",
            PromotionType::Graduation => "graduation",
        }
    }
}

impl fmt::Display for PromotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromotionType {
    type Err = PromotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_students" => Ok(PromotionType::MultipleStudents),
            "entire_class" => Ok(PromotionType::EntireClass),
            "bulk_school" => Ok(PromotionType::BulkSchool),
            "graduation" => Ok(PromotionType::Graduation),
            other => Err(PromotionError::UnknownStatus(other.to_string())),
        }
    }
}

/// Batch status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    InProgress,
    Completed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::InProgress => "in_progress",
            BatchStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = PromotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(BatchStatus::InProgress),
            "completed" => Ok(BatchStatus::Completed),
            other => Err(PromotionError::UnknownStatus(other.to_string())),
        }
    }
}

/// Audit record for one batch run
///
/// Counters are updated as the run proceeds and the batch is marked
/// completed even when some students failed; the failures live in the
/// returned outcome, the counters in this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionBatch {
    pub id: PromotionBatchId,
    /// Human-readable batch name, built from the academic year codes
    pub batch_name: String,
    pub from_year_id: AcademicYearId,
    pub to_year_id: AcademicYearId,
    pub promotion_type: PromotionType,
    pub total_students: u32,
    pub promoted_count: u32,
    pub retained_count: u32,
    pub graduated_count: u32,
    pub failed_count: u32,
    pub initiated_by: StaffId,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PromotionBatch {
    /// Opens a batch in progress
    pub fn open(
        batch_name: impl Into<String>,
        promotion_type: PromotionType,
        from_year_id: AcademicYearId,
        to_year_id: AcademicYearId,
        total_students: u32,
        initiated_by: StaffId,
    ) -> Self {
        Self {
            id: PromotionBatchId::new_v7(),
            batch_name: batch_name.into(),
            from_year_id,
            to_year_id,
            promotion_type,
            total_students,
            promoted_count: 0,
            retained_count: 0,
            graduated_count: 0,
            failed_count: 0,
            initiated_by,
            status: BatchStatus::InProgress,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn record_promoted(&mut self) {
        self.promoted_count += 1;
    }

    pub fn record_graduated(&mut self) {
        self.graduated_count += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed_count += 1;
    }

    /// Folds another batch's counters into this one (bulk-school master batch)
    pub fn absorb(&mut self, other: &PromotionBatch) {
        self.total_students += other.total_students;
        self.promoted_count += other.promoted_count;
        self.retained_count += other.retained_count;
        self.graduated_count += other.graduated_count;
        self.failed_count += other.failed_count;
    }

    /// Closes the batch; partial failures do not keep a batch open
    pub fn complete(&mut self) {
        self.status = BatchStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}

/// History row linking a student's enrollments across a promotion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRecord {
    pub id: PromotionRecordId,
    /// Absent when the promotion ran outside a batch
    pub batch_id: Option<PromotionBatchId>,
    pub student_id: StudentId,
    pub from_enrollment_id: EnrollmentId,
    pub to_enrollment_id: EnrollmentId,
    pub from_class_id: ClassId,
    pub to_class_id: ClassId,
    pub promotion_date: NaiveDate,
    pub promoted_by: StaffId,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One student's failure within a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionFailure {
    pub student_id: StudentId,
    pub reason: String,
}

/// Typed result of a batch run
///
/// `promoted + failed == total` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub batch_id: PromotionBatchId,
    pub total: u32,
    pub promoted: u32,
    pub failed: u32,
    pub errors: Vec<PromotionFailure>,
}
