//! Promotion Domain Ports
//!
//! [`PromotionStore`]'s `apply_promotion` and `apply_graduation` are the
//! atomic units of the promotion workflow: each wraps every table touched
//! for one student in a single database transaction. Batch wrappers call
//! them once per student, so one student's failure rolls back only that
//! student.

use async_trait::async_trait;

use core_kernel::{AcademicYearId, ClassId, DomainPort, PortError, StreamId, StudentId};
use domain_student::{ClassPlacement, Enrollment, Student};

use crate::alumni::Alumni;
use crate::batch::{PromotionBatch, PromotionRecord};

/// Storage port for promotion and graduation processing
#[async_trait]
pub trait PromotionStore: DomainPort {
    /// Retrieves a student by id
    async fn get_student(&self, id: StudentId) -> Result<Student, PortError>;

    /// The student's enrollment for a year, if one exists
    async fn current_enrollment(
        &self,
        student_id: StudentId,
        year_id: AcademicYearId,
    ) -> Result<Option<Enrollment>, PortError>;

    /// Whether a class/stream pair exists and is active
    async fn class_stream_exists(
        &self,
        class_id: ClassId,
        stream_id: StreamId,
    ) -> Result<bool, PortError>;

    /// Display label of a class/stream pair, e.g. "Grade 9 North"
    async fn class_label(
        &self,
        class_id: ClassId,
        stream_id: StreamId,
    ) -> Result<Option<String>, PortError>;

    /// Enrollments of a class/stream/year still awaiting promotion,
    /// in stored order
    async fn pending_students(
        &self,
        class_id: ClassId,
        stream_id: StreamId,
        year_id: AcademicYearId,
    ) -> Result<Vec<Enrollment>, PortError>;

    /// Creates or updates the (class, stream, year) placement
    async fn upsert_class_placement(&self, placement: &ClassPlacement) -> Result<(), PortError>;

    /// Inserts a batch audit record
    async fn insert_batch(&self, batch: &PromotionBatch) -> Result<(), PortError>;

    /// Persists batch counter and status changes
    async fn update_batch(&self, batch: &PromotionBatch) -> Result<(), PortError>;

    /// Applies one student's promotion in one unit: the closed current
    /// enrollment, the new pending enrollment, and the history record.
    /// Fails with `Conflict` if the student already has an enrollment for
    /// the destination year.
    async fn apply_promotion(
        &self,
        current: &Enrollment,
        next: &Enrollment,
        record: &PromotionRecord,
    ) -> Result<(), PortError>;

    /// Applies one student's graduation in one unit: the closed enrollment
    /// and the alumni row
    async fn apply_graduation(
        &self,
        enrollment: &Enrollment,
        alumni: &Alumni,
    ) -> Result<(), PortError>;
}

/// In-memory store for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::{EnrollmentId, PromotionBatchId};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock implementation of [`PromotionStore`]
    ///
    /// Enforces the one-enrollment-per-(student, year) rule the database
    /// schema enforces with a unique constraint.
    #[derive(Debug, Default)]
    pub struct MockPromotionStore {
        students: Arc<RwLock<HashMap<StudentId, Student>>>,
        enrollments: Arc<RwLock<HashMap<EnrollmentId, Enrollment>>>,
        classes: Arc<RwLock<HashMap<(ClassId, StreamId), String>>>,
        placements: Arc<RwLock<HashMap<(ClassId, StreamId, AcademicYearId), ClassPlacement>>>,
        batches: Arc<RwLock<HashMap<PromotionBatchId, PromotionBatch>>>,
        records: Arc<RwLock<Vec<PromotionRecord>>>,
        alumni: Arc<RwLock<Vec<Alumni>>>,
    }

    impl MockPromotionStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn insert_student(&self, student: Student) {
            self.students.write().await.insert(student.id, student);
        }

        pub async fn insert_enrollment(&self, enrollment: Enrollment) {
            self.enrollments
                .write()
                .await
                .insert(enrollment.id, enrollment);
        }

        /// Registers a class/stream pair under a display label
        pub async fn register_class(&self, class_id: ClassId, stream_id: StreamId, label: &str) {
            self.classes
                .write()
                .await
                .insert((class_id, stream_id), label.to_string());
        }

        pub async fn enrollment_snapshot(&self, id: EnrollmentId) -> Option<Enrollment> {
            self.enrollments.read().await.get(&id).cloned()
        }

        pub async fn batch_snapshot(&self, id: PromotionBatchId) -> Option<PromotionBatch> {
            self.batches.read().await.get(&id).cloned()
        }

        pub async fn placement_snapshot(
            &self,
            class_id: ClassId,
            stream_id: StreamId,
            year_id: AcademicYearId,
        ) -> Option<ClassPlacement> {
            self.placements
                .read()
                .await
                .get(&(class_id, stream_id, year_id))
                .cloned()
        }

        pub async fn alumni_for(&self, student_id: StudentId) -> Option<Alumni> {
            self.alumni
                .read()
                .await
                .iter()
                .find(|a| a.student_id == student_id)
                .cloned()
        }

        pub async fn history_len(&self) -> usize {
            self.records.read().await.len()
        }
    }

    impl DomainPort for MockPromotionStore {}

    #[async_trait]
    impl PromotionStore for MockPromotionStore {
        async fn get_student(&self, id: StudentId) -> Result<Student, PortError> {
            self.students
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Student", id))
        }

        async fn current_enrollment(
            &self,
            student_id: StudentId,
            year_id: AcademicYearId,
        ) -> Result<Option<Enrollment>, PortError> {
            Ok(self
                .enrollments
                .read()
                .await
                .values()
                .find(|e| e.student_id == student_id && e.academic_year_id == year_id)
                .cloned())
        }

        async fn class_stream_exists(
            &self,
            class_id: ClassId,
            stream_id: StreamId,
        ) -> Result<bool, PortError> {
            Ok(self
                .classes
                .read()
                .await
                .contains_key(&(class_id, stream_id)))
        }

        async fn class_label(
            &self,
            class_id: ClassId,
            stream_id: StreamId,
        ) -> Result<Option<String>, PortError> {
            Ok(self.classes.read().await.get(&(class_id, stream_id)).cloned())
        }

        async fn pending_students(
            &self,
            class_id: ClassId,
            stream_id: StreamId,
            year_id: AcademicYearId,
        ) -> Result<Vec<Enrollment>, PortError> {
            let mut pending: Vec<_> = self
                .enrollments
                .read()
                .await
                .values()
                .filter(|e| {
                    e.class_id == class_id
                        && e.stream_id == stream_id
                        && e.academic_year_id == year_id
                        && e.is_promotion_pending()
                })
                .cloned()
                .collect();
            pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(pending)
        }

        async fn upsert_class_placement(
            &self,
            placement: &ClassPlacement,
        ) -> Result<(), PortError> {
            self.placements.write().await.insert(
                (
                    placement.class_id,
                    placement.stream_id,
                    placement.academic_year_id,
                ),
                placement.clone(),
            );
            Ok(())
        }

        async fn insert_batch(&self, batch: &PromotionBatch) -> Result<(), PortError> {
            self.batches.write().await.insert(batch.id, batch.clone());
            Ok(())
        }

        async fn update_batch(&self, batch: &PromotionBatch) -> Result<(), PortError> {
            let mut batches = self.batches.write().await;
            if !batches.contains_key(&batch.id) {
                return Err(PortError::not_found("PromotionBatch", batch.id));
            }
            batches.insert(batch.id, batch.clone());
            Ok(())
        }

        async fn apply_promotion(
            &self,
            current: &Enrollment,
            next: &Enrollment,
            record: &PromotionRecord,
        ) -> Result<(), PortError> {
            let mut enrollments = self.enrollments.write().await;
            let duplicate = enrollments.values().any(|e| {
                e.student_id == next.student_id
                    && e.academic_year_id == next.academic_year_id
                    && e.id != current.id
            });
            if duplicate {
                return Err(PortError::conflict(format!(
                    "Student {} already has an enrollment for the destination year",
                    next.student_id
                )));
            }
            enrollments.insert(current.id, current.clone());
            enrollments.insert(next.id, next.clone());
            self.records.write().await.push(record.clone());
            Ok(())
        }

        async fn apply_graduation(
            &self,
            enrollment: &Enrollment,
            alumni: &Alumni,
        ) -> Result<(), PortError> {
            self.enrollments
                .write()
                .await
                .insert(enrollment.id, enrollment.clone());
            self.alumni.write().await.push(alumni.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPromotionStore;
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{PromotionBatchId, PromotionRecordId, StaffId};

    fn enrollment_on(
        student_id: StudentId,
        year_id: AcademicYearId,
        class_id: ClassId,
        stream_id: StreamId,
    ) -> Enrollment {
        Enrollment::new(
            student_id,
            year_id,
            class_id,
            stream_id,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_mock_store_rejects_duplicate_year_enrollment() {
        let store = MockPromotionStore::new();
        let student_id = StudentId::new();
        let from_year = AcademicYearId::new();
        let to_year = AcademicYearId::new();
        let class = ClassId::new();
        let stream = StreamId::new();

        let mut current = enrollment_on(student_id, from_year, class, stream);
        store.insert_enrollment(current.clone()).await;
        // A row for the destination year already exists
        store
            .insert_enrollment(enrollment_on(student_id, to_year, class, stream))
            .await;

        current.mark_promoted(StaffId::new(), None).unwrap();
        let next = enrollment_on(student_id, to_year, class, stream);
        let record = PromotionRecord {
            id: PromotionRecordId::new_v7(),
            batch_id: Some(PromotionBatchId::new()),
            student_id,
            from_enrollment_id: current.id,
            to_enrollment_id: next.id,
            from_class_id: class,
            to_class_id: class,
            promotion_date: NaiveDate::from_ymd_opt(2026, 11, 30).unwrap(),
            promoted_by: StaffId::new(),
            remarks: None,
            created_at: chrono::Utc::now(),
        };

        let result = store.apply_promotion(&current, &next, &record).await;
        assert!(result.unwrap_err().is_conflict());
        assert_eq!(store.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_pending_students_excludes_processed_enrollments() {
        let store = MockPromotionStore::new();
        let year = AcademicYearId::new();
        let class = ClassId::new();
        let stream = StreamId::new();

        let pending = enrollment_on(StudentId::new(), year, class, stream);
        let mut processed = enrollment_on(StudentId::new(), year, class, stream);
        processed.mark_promoted(StaffId::new(), None).unwrap();

        store.insert_enrollment(pending.clone()).await;
        store.insert_enrollment(processed).await;

        let result = store.pending_students(class, stream, year).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, pending.id);
    }
}
