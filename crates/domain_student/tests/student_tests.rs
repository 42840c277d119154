//! Integration tests for the student domain

use chrono::NaiveDate;
use core_kernel::{AcademicYearId, ClassId, StaffId, StreamId};
use domain_student::{Enrollment, EnrollmentStatus, PromotionStatus, Student, StudentStatus};

mod student_lifecycle_tests {
    use super::*;

    #[test]
    fn test_external_transfer_then_readmission() {
        let mut student = Student::new("ADM-1001", "Amina", "Wanjiru");

        student.mark_transferred().unwrap();
        assert_eq!(student.status, StudentStatus::Transferred);
        assert!(student.status.eligible_for_readmission());

        let class = ClassId::new();
        let stream = StreamId::new();
        student.reactivate(class, stream).unwrap();
        assert_eq!(student.status, StudentStatus::Active);
        assert_eq!(student.class_id, Some(class));
        assert_eq!(student.stream_id, Some(stream));
    }

    #[test]
    fn test_active_student_not_eligible_for_readmission() {
        let student = Student::new("ADM-1002", "Brian", "Otieno");
        assert!(!student.status.eligible_for_readmission());
    }

    #[test]
    fn test_suspended_student_cannot_move_streams() {
        let mut student = Student::new("ADM-1003", "Carol", "Mwangi");
        student.update_status(StudentStatus::Suspended).unwrap();

        let result = student.move_to_stream(ClassId::new(), StreamId::new());
        assert!(result.is_err());
    }
}

mod enrollment_tests {
    use super::*;

    fn create_test_enrollment() -> Enrollment {
        Enrollment::new(
            core_kernel::StudentId::new(),
            AcademicYearId::new(),
            ClassId::new(),
            StreamId::new(),
            NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(),
        )
    }

    #[test]
    fn test_enrollment_promotion_cycle() {
        let mut enrollment = create_test_enrollment();
        assert!(enrollment.is_promotion_pending());

        enrollment
            .mark_promoted(StaffId::new(), Some("Promoted to Grade 8".to_string()))
            .unwrap();

        assert_eq!(enrollment.promotion_status, PromotionStatus::Promoted);
        assert_eq!(enrollment.enrollment_status, EnrollmentStatus::Completed);
        assert!(!enrollment.is_promotion_pending());
    }

    #[test]
    fn test_withdrawn_enrollment_is_not_pending() {
        let mut enrollment = create_test_enrollment();
        enrollment.enrollment_status = EnrollmentStatus::Withdrawn;
        assert!(!enrollment.is_promotion_pending());
    }

    #[test]
    fn test_graduation_records_actor_and_remarks() {
        let mut enrollment = create_test_enrollment();
        let actor = StaffId::new();
        enrollment
            .mark_graduated(actor, Some("Completed Grade 9".to_string()))
            .unwrap();

        assert_eq!(enrollment.promotion_status, PromotionStatus::Graduated);
        assert_eq!(enrollment.promoted_by, Some(actor));
        assert_eq!(
            enrollment.promotion_remarks.as_deref(),
            Some("Completed Grade 9")
        );
    }
}
