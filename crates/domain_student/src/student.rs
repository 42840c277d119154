//! Student record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClassId, StreamId, StudentId};

use crate::error::StudentError;

/// Student status
///
/// A student leaves `Active` through a completed transfer (external or
/// graduation) or through administrative action, and returns to it only via
/// a completed re-admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    /// Enrolled and attending
    Active,
    /// On the register but not attending
    Inactive,
    /// Temporarily excluded
    Suspended,
    /// Left through an external transfer
    Transferred,
    /// Completed the final grade
    Graduated,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Suspended => "suspended",
            StudentStatus::Transferred => "transferred",
            StudentStatus::Graduated => "graduated",
        }
    }

    /// Statuses from which a student may apply for re-admission
    pub fn eligible_for_readmission(&self) -> bool {
        matches!(
            self,
            StudentStatus::Transferred
                | StudentStatus::Graduated
                | StudentStatus::Suspended
                | StudentStatus::Inactive
        )
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentStatus {
    type Err = StudentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(StudentStatus::Active),
            "inactive" => Ok(StudentStatus::Inactive),
            "suspended" => Ok(StudentStatus::Suspended),
            "transferred" => Ok(StudentStatus::Transferred),
            "graduated" => Ok(StudentStatus::Graduated),
            other => Err(StudentError::UnknownStatus(other.to_string())),
        }
    }
}

/// A student on the school register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier
    pub id: StudentId,
    /// Admission number assigned at first enrollment
    pub admission_no: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Status
    pub status: StudentStatus,
    /// Current class, if placed
    pub class_id: Option<ClassId>,
    /// Current stream within the class, if placed
    pub stream_id: Option<StreamId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Creates a new active student
    pub fn new(admission_no: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: StudentId::new_v7(),
            admission_no: admission_no.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            status: StudentStatus::Active,
            class_id: None,
            stream_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }

    /// Marks the student as transferred out (external transfer completion)
    pub fn mark_transferred(&mut self) -> Result<(), StudentError> {
        self.update_status(StudentStatus::Transferred)
    }

    /// Marks the student as graduated (graduation transfer completion)
    pub fn mark_graduated(&mut self) -> Result<(), StudentError> {
        self.update_status(StudentStatus::Graduated)
    }

    /// Moves the student to a new class and stream (internal transfer completion)
    pub fn move_to_stream(&mut self, class_id: ClassId, stream_id: StreamId) -> Result<(), StudentError> {
        if self.status != StudentStatus::Active {
            return Err(StudentError::NotEligible(format!(
                "Cannot move a {} student between streams",
                self.status
            )));
        }
        self.class_id = Some(class_id);
        self.stream_id = Some(stream_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Reactivates the student into a class and stream (re-admission completion)
    pub fn reactivate(&mut self, class_id: ClassId, stream_id: StreamId) -> Result<(), StudentError> {
        self.update_status(StudentStatus::Active)?;
        self.class_id = Some(class_id);
        self.stream_id = Some(stream_id);
        Ok(())
    }

    /// Updates the status
    pub fn update_status(&mut self, status: StudentStatus) -> Result<(), StudentError> {
        if !self.can_transition_to(status) {
            return Err(StudentError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Checks if transition is valid
    fn can_transition_to(&self, target: StudentStatus) -> bool {
        use StudentStatus::*;
        matches!(
            (self.status, target),
            (Active, Inactive)
                | (Active, Suspended)
                | (Active, Transferred)
                | (Active, Graduated)
                | (Inactive, Active)
                | (Suspended, Active)
                | (Transferred, Active)
                | (Graduated, Active)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_student_is_active() {
        let student = Student::new("ADM-0001", "Amina", "Wanjiru");
        assert!(student.is_active());
        assert_eq!(student.full_name(), "Amina Wanjiru");
    }

    #[test]
    fn test_transferred_student_cannot_graduate() {
        let mut student = Student::new("ADM-0002", "Brian", "Otieno");
        student.mark_transferred().unwrap();
        let result = student.mark_graduated();
        assert!(matches!(
            result,
            Err(StudentError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_reactivate_from_graduated() {
        let mut student = Student::new("ADM-0003", "Carol", "Mwangi");
        student.mark_graduated().unwrap();
        assert!(student.status.eligible_for_readmission());

        student
            .reactivate(core_kernel::ClassId::new(), core_kernel::StreamId::new())
            .unwrap();
        assert!(student.is_active());
        assert!(student.class_id.is_some());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            StudentStatus::Active,
            StudentStatus::Inactive,
            StudentStatus::Suspended,
            StudentStatus::Transferred,
            StudentStatus::Graduated,
        ] {
            let parsed: StudentStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
