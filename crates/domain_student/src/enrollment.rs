//! Class enrollments
//!
//! An enrollment ties a student to a class and stream for one academic year.
//! Promotion state lives here, not on the student: the student record says
//! who they are, the enrollment says where they stand this year.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AcademicYearId, ClassId, EnrollmentId, StaffId, StreamId, StudentId};

use crate::error::StudentError;

/// Enrollment status within the academic year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Registered for the year
    Enrolled,
    /// Attending
    Active,
    /// Finished the year
    Completed,
    /// Left during the year
    Withdrawn,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Withdrawn => "withdrawn",
        }
    }

    /// Enrollments in these statuses count as current for promotion purposes
    pub fn is_open(&self) -> bool {
        matches!(self, EnrollmentStatus::Enrolled | EnrollmentStatus::Active)
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = StudentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enrolled" => Ok(EnrollmentStatus::Enrolled),
            "active" => Ok(EnrollmentStatus::Active),
            "completed" => Ok(EnrollmentStatus::Completed),
            "withdrawn" => Ok(EnrollmentStatus::Withdrawn),
            other => Err(StudentError::UnknownStatus(other.to_string())),
        }
    }
}

/// Where the enrollment stands in the year-end promotion cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    /// Not yet processed
    Pending,
    /// Moved up to the next class
    Promoted,
    /// Finished the final grade
    Graduated,
    /// Held back in the same class
    Retained,
    /// Left via a transfer before processing
    Transferred,
}

impl PromotionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionStatus::Pending => "pending",
            PromotionStatus::Promoted => "promoted",
            PromotionStatus::Graduated => "graduated",
            PromotionStatus::Retained => "retained",
            PromotionStatus::Transferred => "transferred",
        }
    }
}

impl fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromotionStatus {
    type Err = StudentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PromotionStatus::Pending),
            "promoted" => Ok(PromotionStatus::Promoted),
            "graduated" => Ok(PromotionStatus::Graduated),
            "retained" => Ok(PromotionStatus::Retained),
            "transferred" => Ok(PromotionStatus::Transferred),
            other => Err(StudentError::UnknownStatus(other.to_string())),
        }
    }
}

/// A student's enrollment in a class for one academic year
///
/// Unique per (student, academic year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    /// Unique identifier
    pub id: EnrollmentId,
    /// The enrolled student
    pub student_id: StudentId,
    /// Academic year
    pub academic_year_id: AcademicYearId,
    /// Class
    pub class_id: ClassId,
    /// Stream within the class
    pub stream_id: StreamId,
    /// Enrollment status
    pub enrollment_status: EnrollmentStatus,
    /// Promotion state for this year
    pub promotion_status: PromotionStatus,
    /// Date the enrollment took effect
    pub enrollment_date: NaiveDate,
    /// Staff member who processed the promotion, once processed
    pub promoted_by: Option<StaffId>,
    /// Remarks recorded at promotion time
    pub promotion_remarks: Option<String>,
    /// When the promotion was processed
    pub promoted_at: Option<DateTime<Utc>>,
    /// Final average for the year, when results are in
    pub final_average: Option<Decimal>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Creates a fresh pending enrollment for a year
    pub fn new(
        student_id: StudentId,
        academic_year_id: AcademicYearId,
        class_id: ClassId,
        stream_id: StreamId,
        enrollment_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EnrollmentId::new_v7(),
            student_id,
            academic_year_id,
            class_id,
            stream_id,
            enrollment_status: EnrollmentStatus::Enrolled,
            promotion_status: PromotionStatus::Pending,
            enrollment_date,
            promoted_by: None,
            promotion_remarks: None,
            promoted_at: None,
            final_average: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if this enrollment still awaits promotion processing
    pub fn is_promotion_pending(&self) -> bool {
        self.enrollment_status.is_open() && self.promotion_status == PromotionStatus::Pending
    }

    /// Marks the enrollment promoted
    pub fn mark_promoted(&mut self, actor: StaffId, remarks: Option<String>) -> Result<(), StudentError> {
        self.close(PromotionStatus::Promoted, actor, remarks)
    }

    /// Marks the enrollment graduated
    pub fn mark_graduated(&mut self, actor: StaffId, remarks: Option<String>) -> Result<(), StudentError> {
        self.close(PromotionStatus::Graduated, actor, remarks)
    }

    /// Marks the enrollment retained for the year
    pub fn mark_retained(&mut self, actor: StaffId, remarks: Option<String>) -> Result<(), StudentError> {
        self.close(PromotionStatus::Retained, actor, remarks)
    }

    fn close(&mut self, status: PromotionStatus, actor: StaffId, remarks: Option<String>) -> Result<(), StudentError> {
        if self.promotion_status != PromotionStatus::Pending {
            return Err(StudentError::EnrollmentAlreadyProcessed(
                self.promotion_status.to_string(),
            ));
        }
        let now = Utc::now();
        self.enrollment_status = EnrollmentStatus::Completed;
        self.promotion_status = status;
        self.promoted_by = Some(actor);
        self.promotion_remarks = remarks;
        self.promoted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}
