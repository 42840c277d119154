//! Promotion and graduation scenarios against the in-memory store

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{AcademicYearId, ClassId, StaffId, StreamId, StudentId};
use domain_promotion::ports::mock::MockPromotionStore;
use domain_promotion::{
    ClassAssignment, ClassPromotionMapping, GraduationDetails, PromotionEngine, PromotionError,
    PromotionStore, PromotionTarget,
};
use domain_student::ports::mock::MockAcademicCalendar;
use domain_student::{AcademicYear, Enrollment, EnrollmentStatus, PromotionStatus, Student, StudentStatus};

struct Harness {
    engine: PromotionEngine,
    store: Arc<MockPromotionStore>,
    from_year: AcademicYearId,
    to_year: AcademicYearId,
    actor: StaffId,
}

fn year(code: &str, is_current: bool) -> AcademicYear {
    AcademicYear {
        id: AcademicYearId::new(),
        year_code: code.to_string(),
        year_name: format!("Academic Year {}", code),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
        is_current,
    }
}

async fn harness() -> Harness {
    let from = year("2026", true);
    let to = year("2027", false);
    let from_year = from.id;
    let to_year = to.id;
    let calendar = Arc::new(MockAcademicCalendar::with_years(vec![from, to]).await);
    let store = Arc::new(MockPromotionStore::new());
    let engine = PromotionEngine::new(store.clone(), calendar);
    Harness {
        engine,
        store,
        from_year,
        to_year,
        actor: StaffId::new(),
    }
}

/// Enrolls a fresh active student into (class, stream) for the year
async fn enroll_student(harness: &Harness, class: ClassId, stream: StreamId, admission_no: &str) -> (StudentId, Enrollment) {
    let mut student = Student::new(admission_no, "Test", "Student");
    student.class_id = Some(class);
    student.stream_id = Some(stream);
    let student_id = student.id;
    let enrollment = Enrollment::new(
        student_id,
        harness.from_year,
        class,
        stream,
        NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(),
    );
    harness.store.insert_student(student).await;
    harness.store.insert_enrollment(enrollment.clone()).await;
    (student_id, enrollment)
}

#[tokio::test]
async fn test_single_student_promotion() {
    let harness = harness().await;
    let from_class = ClassId::new();
    let from_stream = StreamId::new();
    let to_class = ClassId::new();
    let to_stream = StreamId::new();
    harness.store.register_class(from_class, from_stream, "Grade 3 East").await;
    harness.store.register_class(to_class, to_stream, "Grade 4 East").await;

    let (student_id, enrollment) = enroll_student(&harness, from_class, from_stream, "ADM-7001").await;

    let next = harness
        .engine
        .promote_student(
            student_id,
            PromotionTarget { class_id: to_class, stream_id: to_stream },
            harness.from_year,
            harness.to_year,
            Some("End of year promotion".to_string()),
            harness.actor,
        )
        .await
        .unwrap();

    assert_eq!(next.academic_year_id, harness.to_year);
    assert_eq!(next.class_id, to_class);
    assert_eq!(next.promotion_status, PromotionStatus::Pending);

    let old = harness.store.enrollment_snapshot(enrollment.id).await.unwrap();
    assert_eq!(old.promotion_status, PromotionStatus::Promoted);
    assert_eq!(old.enrollment_status, EnrollmentStatus::Completed);
    assert_eq!(old.promoted_by, Some(harness.actor));
    assert_eq!(harness.store.history_len().await, 1);
}

#[tokio::test]
async fn test_promotion_requires_pending_enrollment() {
    let harness = harness().await;
    let class = ClassId::new();
    let stream = StreamId::new();
    harness.store.register_class(class, stream, "Grade 5 West").await;

    let (student_id, mut enrollment) = enroll_student(&harness, class, stream, "ADM-7002").await;
    enrollment.mark_retained(StaffId::new(), None).unwrap();
    harness.store.insert_enrollment(enrollment).await;

    let result = harness
        .engine
        .promote_student(
            student_id,
            PromotionTarget { class_id: class, stream_id: stream },
            harness.from_year,
            harness.to_year,
            None,
            harness.actor,
        )
        .await;
    assert!(matches!(result, Err(PromotionError::Student(_))));
}

#[tokio::test]
async fn test_transferred_student_cannot_be_promoted() {
    let harness = harness().await;
    let class = ClassId::new();
    let stream = StreamId::new();
    harness.store.register_class(class, stream, "Grade 6 North").await;

    let mut student = Student::new("ADM-7003", "Test", "Student");
    student.update_status(StudentStatus::Transferred).unwrap();
    let student_id = student.id;
    harness.store.insert_student(student).await;

    let result = harness
        .engine
        .promote_student(
            student_id,
            PromotionTarget { class_id: class, stream_id: stream },
            harness.from_year,
            harness.to_year,
            None,
            harness.actor,
        )
        .await;
    assert!(matches!(result, Err(PromotionError::StudentTransferred(_))));
}

#[tokio::test]
async fn test_batch_collects_failures_without_aborting() {
    let harness = harness().await;
    let from_class = ClassId::new();
    let from_stream = StreamId::new();
    let to_class = ClassId::new();
    let to_stream = StreamId::new();
    harness.store.register_class(from_class, from_stream, "Grade 7 South").await;
    harness.store.register_class(to_class, to_stream, "Grade 8 South").await;

    let mut ids = Vec::new();
    for i in 0..28 {
        let (id, _) = enroll_student(&harness, from_class, from_stream, &format!("ADM-71{:02}", i)).await;
        ids.push(id);
    }
    // Two students with no enrollment for the source year
    for i in 0..2 {
        let student = Student::new(format!("ADM-72{:02}", i), "No", "Enrollment");
        ids.push(student.id);
        harness.store.insert_student(student).await;
    }

    let outcome = harness
        .engine
        .promote_students(
            &ids,
            PromotionTarget { class_id: to_class, stream_id: to_stream },
            harness.from_year,
            harness.to_year,
            None,
            harness.actor,
        )
        .await
        .unwrap();

    assert_eq!(outcome.total, 30);
    assert_eq!(outcome.promoted, 28);
    assert_eq!(outcome.failed, 2);
    assert_eq!(outcome.promoted + outcome.failed, outcome.total);
    assert_eq!(outcome.errors.len(), 2);

    // The batch is completed despite the partial failures
    let batch = harness.store.batch_snapshot(outcome.batch_id).await.unwrap();
    assert_eq!(batch.status.as_str(), "completed");
    assert_eq!(batch.promoted_count, 28);
    assert_eq!(batch.failed_count, 2);
}

#[tokio::test]
async fn test_entire_class_promotion_with_assignment() {
    let harness = harness().await;
    let from_class = ClassId::new();
    let from_stream = StreamId::new();
    let to_class = ClassId::new();
    let to_stream = StreamId::new();
    harness.store.register_class(from_class, from_stream, "Grade 4 East").await;
    harness.store.register_class(to_class, to_stream, "Grade 5 East").await;

    for i in 0..5 {
        enroll_student(&harness, from_class, from_stream, &format!("ADM-73{:02}", i)).await;
    }

    let teacher = StaffId::new();
    let outcome = harness
        .engine
        .promote_class(
            from_class,
            from_stream,
            PromotionTarget { class_id: to_class, stream_id: to_stream },
            harness.from_year,
            harness.to_year,
            Some(ClassAssignment {
                class_teacher_id: Some(teacher),
                classroom: Some("Room 12".to_string()),
            }),
            harness.actor,
        )
        .await
        .unwrap();

    assert_eq!(outcome.total, 5);
    assert_eq!(outcome.promoted, 5);
    assert_eq!(outcome.failed, 0);

    let batch = harness.store.batch_snapshot(outcome.batch_id).await.unwrap();
    assert_eq!(batch.batch_name, "Class Promotion - Grade 4 East");

    let placement = harness
        .store
        .placement_snapshot(to_class, to_stream, harness.to_year)
        .await
        .unwrap();
    assert_eq!(placement.class_teacher_id, Some(teacher));
    assert_eq!(placement.classroom.as_deref(), Some("Room 12"));
}

#[tokio::test]
async fn test_bulk_school_promotion_aggregates_class_results() {
    let harness = harness().await;
    let mut mappings = Vec::new();
    let mut counts = Vec::new();
    for (i, (label_from, label_to)) in [("Grade 1 West", "Grade 2 West"), ("Grade 2 West", "Grade 3 West")]
        .into_iter()
        .enumerate()
    {
        let from_class = ClassId::new();
        let from_stream = StreamId::new();
        let to_class = ClassId::new();
        let to_stream = StreamId::new();
        harness.store.register_class(from_class, from_stream, label_from).await;
        harness.store.register_class(to_class, to_stream, label_to).await;

        let students = 3 + i;
        for j in 0..students {
            enroll_student(&harness, from_class, from_stream, &format!("ADM-74{}{:02}", i, j)).await;
        }
        counts.push(students as u32);
        mappings.push(ClassPromotionMapping {
            from_class_id: from_class,
            from_stream_id: from_stream,
            target: PromotionTarget { class_id: to_class, stream_id: to_stream },
            assignment: None,
        });
    }

    let outcome = harness
        .engine
        .promote_school(mappings, harness.from_year, harness.to_year, harness.actor)
        .await
        .unwrap();

    assert_eq!(outcome.total, counts.iter().sum::<u32>());
    assert_eq!(outcome.promoted, outcome.total);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.class_results.len(), 2);
    assert_eq!(outcome.class_results[0].class_label, "Grade 1 West");

    let master = harness.store.batch_snapshot(outcome.batch_id).await.unwrap();
    assert_eq!(master.batch_name, "Bulk School Promotion 2026 -> 2027");
    assert_eq!(master.promoted_count, outcome.total);
}

#[tokio::test]
async fn test_graduation_requires_a_grade_9_class() {
    let harness = harness().await;
    let class = ClassId::new();
    let stream = StreamId::new();
    harness.store.register_class(class, stream, "Grade 8 North").await;

    let result = harness
        .engine
        .graduate_class(
            class,
            stream,
            harness.from_year,
            NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            HashMap::new(),
            harness.actor,
        )
        .await;
    assert!(matches!(result, Err(PromotionError::NotAGraduatingClass(_))));
}

#[tokio::test]
async fn test_graduation_records_alumni_and_leaves_student_status() {
    let harness = harness().await;
    let class = ClassId::new();
    let stream = StreamId::new();
    harness.store.register_class(class, stream, "Grade 9 North").await;

    let (student_id, mut enrollment) = enroll_student(&harness, class, stream, "ADM-7501").await;
    enrollment.final_average = Some(dec!(68.25));
    harness.store.insert_enrollment(enrollment.clone()).await;

    let mut details = HashMap::new();
    details.insert(
        student_id,
        GraduationDetails {
            awards: Some("Best in Science".to_string()),
            honors: None,
            next_destination: Some("Starehe Boys Centre".to_string()),
        },
    );

    let outcome = harness
        .engine
        .graduate_class(
            class,
            stream,
            harness.from_year,
            NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            details,
            harness.actor,
        )
        .await
        .unwrap();

    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.graduated, 1);
    assert_eq!(outcome.failed, 0);

    let batch = harness.store.batch_snapshot(outcome.batch_id).await.unwrap();
    assert_eq!(batch.batch_name, "Grade 9 Graduation - 2026");

    let closed = harness.store.enrollment_snapshot(enrollment.id).await.unwrap();
    assert_eq!(closed.promotion_status, PromotionStatus::Graduated);

    let alumni = harness.store.alumni_for(student_id).await.unwrap();
    assert_eq!(alumni.final_average, Some(dec!(68.25)));
    assert_eq!(alumni.awards.as_deref(), Some("Best in Science"));

    // Graduation processing never touches the student record; only a
    // completed graduation transfer flips the status
    let student = harness.store.get_student(student_id).await.unwrap();
    assert_eq!(student.status, StudentStatus::Active);
}

#[tokio::test]
async fn test_duplicate_destination_enrollment_fails_only_that_student() {
    let harness = harness().await;
    let from_class = ClassId::new();
    let from_stream = StreamId::new();
    let to_class = ClassId::new();
    let to_stream = StreamId::new();
    harness.store.register_class(from_class, from_stream, "Grade 2 East").await;
    harness.store.register_class(to_class, to_stream, "Grade 3 East").await;

    let (clean_id, _) = enroll_student(&harness, from_class, from_stream, "ADM-7601").await;
    let (dup_id, _) = enroll_student(&harness, from_class, from_stream, "ADM-7602").await;
    // The second student somehow already holds a destination-year row
    harness
        .store
        .insert_enrollment(Enrollment::new(
            dup_id,
            harness.to_year,
            to_class,
            to_stream,
            NaiveDate::from_ymd_opt(2027, 1, 4).unwrap(),
        ))
        .await;

    let outcome = harness
        .engine
        .promote_students(
            &[clean_id, dup_id],
            PromotionTarget { class_id: to_class, stream_id: to_stream },
            harness.from_year,
            harness.to_year,
            None,
            harness.actor,
        )
        .await
        .unwrap();

    assert_eq!(outcome.promoted, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.errors[0].student_id, dup_id);
}
