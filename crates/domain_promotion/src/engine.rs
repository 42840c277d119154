//! Promotion engine
//!
//! One atomic single-student primitive, four batch shapes on top. Batch
//! wrappers never hold a transaction across students: each primitive call
//! is its own unit of work, so one student's failure rolls back only that
//! student, and the batch carries on.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{
    AcademicYearId, ClassId, PromotionBatchId, PromotionRecordId, StaffId, StreamId, StudentId,
};
use domain_student::{AcademicCalendar, ClassPlacement, Enrollment, StudentStatus};

use crate::alumni::{Alumni, GraduationDetails};
use crate::batch::{
    BatchOutcome, PromotionBatch, PromotionFailure, PromotionRecord, PromotionType,
};
use crate::error::PromotionError;
use crate::ports::PromotionStore;

/// Destination class/stream of a promotion
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PromotionTarget {
    pub class_id: ClassId,
    pub stream_id: StreamId,
}

/// Teacher/classroom assignment applied to the destination placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassAssignment {
    pub class_teacher_id: Option<StaffId>,
    pub classroom: Option<String>,
}

/// One source class/stream and where its students go
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassPromotionMapping {
    pub from_class_id: ClassId,
    pub from_stream_id: StreamId,
    pub target: PromotionTarget,
    pub assignment: Option<ClassAssignment>,
}

/// Per-class result within a whole-school run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassPromotionResult {
    pub from_class_id: ClassId,
    pub from_stream_id: StreamId,
    pub class_label: String,
    pub outcome: BatchOutcome,
}

/// Typed result of a whole-school run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub batch_id: PromotionBatchId,
    pub total: u32,
    pub promoted: u32,
    pub failed: u32,
    pub class_results: Vec<ClassPromotionResult>,
}

/// Typed result of a graduation run
///
/// `graduated + failed == total` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationOutcome {
    pub batch_id: PromotionBatchId,
    pub total: u32,
    pub graduated: u32,
    pub failed: u32,
    pub errors: Vec<PromotionFailure>,
}

/// Drives year-end promotion and graduation processing
pub struct PromotionEngine {
    store: Arc<dyn PromotionStore>,
    calendar: Arc<dyn AcademicCalendar>,
}

impl PromotionEngine {
    pub fn new(store: Arc<dyn PromotionStore>, calendar: Arc<dyn AcademicCalendar>) -> Self {
        Self { store, calendar }
    }

    /// Promotes one student from `from_year` into `to_year`
    ///
    /// Closes the current enrollment, opens a pending one in the target
    /// class/stream, and records the history row, all in one atomic store
    /// call. Returns the new enrollment.
    #[instrument(skip(self, remarks), fields(student_id = %student_id))]
    pub async fn promote_student(
        &self,
        student_id: StudentId,
        target: PromotionTarget,
        from_year: AcademicYearId,
        to_year: AcademicYearId,
        remarks: Option<String>,
        actor: StaffId,
    ) -> Result<Enrollment, PromotionError> {
        let enrollment = self
            .promote_one(student_id, target, from_year, to_year, remarks, None, actor)
            .await?;
        info!(enrollment_id = %enrollment.id, "Student promoted");
        Ok(enrollment)
    }

    /// Promotes a picked set of students under one batch
    ///
    /// Failures are collected per student and never abort the run; the batch
    /// is completed regardless.
    #[instrument(skip(self, student_ids, remarks), fields(count = student_ids.len()))]
    pub async fn promote_students(
        &self,
        student_ids: &[StudentId],
        target: PromotionTarget,
        from_year: AcademicYearId,
        to_year: AcademicYearId,
        remarks: Option<String>,
        actor: StaffId,
    ) -> Result<BatchOutcome, PromotionError> {
        let batch_name = format!(
            "Student Promotion {} -> {}",
            self.year_code(from_year).await?,
            self.year_code(to_year).await?
        );
        let mut batch = PromotionBatch::open(
            batch_name,
            PromotionType::MultipleStudents,
            from_year,
            to_year,
            student_ids.len() as u32,
            actor,
        );
        self.store.insert_batch(&batch).await?;

        let outcome = self
            .run_promotion_loop(student_ids, target, from_year, to_year, remarks, &mut batch, actor)
            .await?;
        info!(
            batch_id = %outcome.batch_id,
            promoted = outcome.promoted,
            failed = outcome.failed,
            "Student promotion batch completed"
        );
        Ok(outcome)
    }

    /// Promotes every pending student of one class/stream
    ///
    /// An optional assignment sets the destination placement's class teacher
    /// and classroom before the run.
    #[instrument(skip(self, assignment), fields(class_id = %from_class_id, stream_id = %from_stream_id))]
    pub async fn promote_class(
        &self,
        from_class_id: ClassId,
        from_stream_id: StreamId,
        target: PromotionTarget,
        from_year: AcademicYearId,
        to_year: AcademicYearId,
        assignment: Option<ClassAssignment>,
        actor: StaffId,
    ) -> Result<BatchOutcome, PromotionError> {
        let (_, outcome) = self
            .promote_class_inner(
                from_class_id,
                from_stream_id,
                target,
                from_year,
                to_year,
                assignment,
                None,
                actor,
            )
            .await?;
        Ok(outcome)
    }

    /// Promotes the whole school over a caller-supplied class mapping
    ///
    /// Each mapping runs as its own entire-class batch; totals aggregate
    /// into one master batch. Mappings are processed in the given order.
    #[instrument(skip(self, mappings), fields(classes = mappings.len()))]
    pub async fn promote_school(
        &self,
        mappings: Vec<ClassPromotionMapping>,
        from_year: AcademicYearId,
        to_year: AcademicYearId,
        actor: StaffId,
    ) -> Result<BulkOutcome, PromotionError> {
        let batch_name = format!(
            "Bulk School Promotion {} -> {}",
            self.year_code(from_year).await?,
            self.year_code(to_year).await?
        );
        let mut master = PromotionBatch::open(
            batch_name,
            PromotionType::BulkSchool,
            from_year,
            to_year,
            0,
            actor,
        );
        self.store.insert_batch(&master).await?;

        let mut class_results = Vec::with_capacity(mappings.len());
        for mapping in mappings {
            let (label, outcome) = self
                .promote_class_inner(
                    mapping.from_class_id,
                    mapping.from_stream_id,
                    mapping.target,
                    from_year,
                    to_year,
                    mapping.assignment,
                    Some(&mut master),
                    actor,
                )
                .await?;
            class_results.push(ClassPromotionResult {
                from_class_id: mapping.from_class_id,
                from_stream_id: mapping.from_stream_id,
                class_label: label,
                outcome,
            });
        }

        master.complete();
        self.store.update_batch(&master).await?;
        info!(
            batch_id = %master.id,
            total = master.total_students,
            promoted = master.promoted_count,
            failed = master.failed_count,
            "Bulk school promotion completed"
        );
        Ok(BulkOutcome {
            batch_id: master.id,
            total: master.total_students,
            promoted: master.promoted_count,
            failed: master.failed_count,
            class_results,
        })
    }

    /// Graduates the pending students of a final-grade class
    ///
    /// Refused unless the class label identifies a Grade 9 class. Each
    /// student's closed enrollment and alumni row land in one atomic call;
    /// student records keep their status, which only flips when a
    /// graduation-type transfer completes.
    #[instrument(skip(self, details), fields(class_id = %class_id, stream_id = %stream_id))]
    pub async fn graduate_class(
        &self,
        class_id: ClassId,
        stream_id: StreamId,
        year_id: AcademicYearId,
        graduation_date: NaiveDate,
        mut details: HashMap<StudentId, GraduationDetails>,
        actor: StaffId,
    ) -> Result<GraduationOutcome, PromotionError> {
        let label = self
            .store
            .class_label(class_id, stream_id)
            .await?
            .ok_or(PromotionError::UnknownClassStream)?;
        if !label.contains("Grade 9") {
            return Err(PromotionError::NotAGraduatingClass(label));
        }

        let pending = self.store.pending_students(class_id, stream_id, year_id).await?;
        let batch_name = format!("Grade 9 Graduation - {}", self.year_code(year_id).await?);
        let mut batch = PromotionBatch::open(
            batch_name,
            PromotionType::Graduation,
            year_id,
            year_id,
            pending.len() as u32,
            actor,
        );
        self.store.insert_batch(&batch).await?;

        let mut errors = Vec::new();
        for enrollment in pending {
            let student_id = enrollment.student_id;
            match self
                .graduate_one(enrollment, graduation_date, details.remove(&student_id).unwrap_or_default(), actor)
                .await
            {
                Ok(()) => batch.record_graduated(),
                Err(e) => {
                    warn!(student_id = %student_id, error = %e, "Graduation failed for student");
                    batch.record_failure();
                    errors.push(PromotionFailure {
                        student_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        batch.complete();
        self.store.update_batch(&batch).await?;
        info!(
            batch_id = %batch.id,
            graduated = batch.graduated_count,
            failed = batch.failed_count,
            "Graduation batch completed"
        );
        Ok(GraduationOutcome {
            batch_id: batch.id,
            total: batch.total_students,
            graduated: batch.graduated_count,
            failed: batch.failed_count,
            errors,
        })
    }

    /// The atomic single-student primitive
    async fn promote_one(
        &self,
        student_id: StudentId,
        target: PromotionTarget,
        from_year: AcademicYearId,
        to_year: AcademicYearId,
        remarks: Option<String>,
        batch_id: Option<PromotionBatchId>,
        actor: StaffId,
    ) -> Result<Enrollment, PromotionError> {
        let student = self.store.get_student(student_id).await.map_err(|e| match e {
            e if e.is_not_found() => PromotionError::StudentNotFound(student_id.to_string()),
            e => PromotionError::Store(e),
        })?;
        if student.status == StudentStatus::Transferred {
            return Err(PromotionError::StudentTransferred(student_id.to_string()));
        }

        let mut current = self
            .store
            .current_enrollment(student_id, from_year)
            .await?
            .ok_or_else(|| PromotionError::NotEnrolled {
                student: student_id.to_string(),
                year: from_year.to_string(),
            })?;

        if !self
            .store
            .class_stream_exists(target.class_id, target.stream_id)
            .await?
        {
            return Err(PromotionError::UnknownClassStream);
        }

        let from_class_id = current.class_id;
        current.mark_promoted(actor, remarks.clone())?;

        let today = Utc::now().date_naive();
        let next = Enrollment::new(student_id, to_year, target.class_id, target.stream_id, today);
        let record = PromotionRecord {
            id: PromotionRecordId::new_v7(),
            batch_id,
            student_id,
            from_enrollment_id: current.id,
            to_enrollment_id: next.id,
            from_class_id,
            to_class_id: target.class_id,
            promotion_date: today,
            promoted_by: actor,
            remarks,
            created_at: Utc::now(),
        };

        self.store.apply_promotion(&current, &next, &record).await?;
        Ok(next)
    }

    async fn graduate_one(
        &self,
        mut enrollment: Enrollment,
        graduation_date: NaiveDate,
        details: GraduationDetails,
        actor: StaffId,
    ) -> Result<(), PromotionError> {
        enrollment.mark_graduated(actor, None)?;
        let alumni = Alumni::from_enrollment(&enrollment, graduation_date, details);
        self.store.apply_graduation(&enrollment, &alumni).await?;
        Ok(())
    }

    /// Catch-and-continue loop shared by the batch shapes
    #[allow(clippy::too_many_arguments)]
    async fn run_promotion_loop(
        &self,
        student_ids: &[StudentId],
        target: PromotionTarget,
        from_year: AcademicYearId,
        to_year: AcademicYearId,
        remarks: Option<String>,
        batch: &mut PromotionBatch,
        actor: StaffId,
    ) -> Result<BatchOutcome, PromotionError> {
        let mut errors = Vec::new();
        for &student_id in student_ids {
            match self
                .promote_one(
                    student_id,
                    target,
                    from_year,
                    to_year,
                    remarks.clone(),
                    Some(batch.id),
                    actor,
                )
                .await
            {
                Ok(_) => batch.record_promoted(),
                Err(e) => {
                    warn!(student_id = %student_id, error = %e, "Promotion failed for student");
                    batch.record_failure();
                    errors.push(PromotionFailure {
                        student_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        batch.complete();
        self.store.update_batch(batch).await?;
        Ok(BatchOutcome {
            batch_id: batch.id,
            total: batch.total_students,
            promoted: batch.promoted_count,
            failed: batch.failed_count,
            errors,
        })
    }

    /// Entire-class run; when `master` is given the class batch's counters
    /// fold into it (whole-school aggregation)
    #[allow(clippy::too_many_arguments)]
    async fn promote_class_inner(
        &self,
        from_class_id: ClassId,
        from_stream_id: StreamId,
        target: PromotionTarget,
        from_year: AcademicYearId,
        to_year: AcademicYearId,
        assignment: Option<ClassAssignment>,
        master: Option<&mut PromotionBatch>,
        actor: StaffId,
    ) -> Result<(String, BatchOutcome), PromotionError> {
        let label = self
            .store
            .class_label(from_class_id, from_stream_id)
            .await?
            .ok_or(PromotionError::UnknownClassStream)?;

        if let Some(assignment) = assignment {
            let placement = ClassPlacement::new(
                target.class_id,
                target.stream_id,
                to_year,
                assignment.class_teacher_id,
                assignment.classroom,
            );
            self.store.upsert_class_placement(&placement).await?;
        }

        let pending = self
            .store
            .pending_students(from_class_id, from_stream_id, from_year)
            .await?;
        let student_ids: Vec<StudentId> = pending.iter().map(|e| e.student_id).collect();

        let mut batch = PromotionBatch::open(
            format!("Class Promotion - {}", label),
            PromotionType::EntireClass,
            from_year,
            to_year,
            student_ids.len() as u32,
            actor,
        );
        self.store.insert_batch(&batch).await?;

        let outcome = self
            .run_promotion_loop(&student_ids, target, from_year, to_year, None, &mut batch, actor)
            .await?;

        if let Some(master) = master {
            master.absorb(&batch);
        }
        info!(
            batch_id = %outcome.batch_id,
            class = %label,
            promoted = outcome.promoted,
            failed = outcome.failed,
            "Class promotion completed"
        );
        Ok((label, outcome))
    }

    async fn year_code(&self, year_id: AcademicYearId) -> Result<String, PromotionError> {
        Ok(self.calendar.get_year(year_id).await?.year_code)
    }
}
