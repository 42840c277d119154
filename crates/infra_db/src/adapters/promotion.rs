//! PostgreSQL Promotion Store
//!
//! Implements [`PromotionStore`]. `apply_promotion` and `apply_graduation`
//! are the transactional units of the batch engine: each wraps every table
//! touched for one student, so a mid-batch failure rolls back only that
//! student. The unique constraint on (student_id, academic_year_id) makes a
//! duplicate destination enrollment a `Conflict` rather than silent data.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    AcademicYearId, AdapterHealth, ClassId, DomainPort, EnrollmentId, HealthCheckResult,
    HealthCheckable, PortError, PromotionBatchId, StaffId, StreamId, StudentId,
};
use domain_promotion::{Alumni, PromotionBatch, PromotionRecord, PromotionStore};
use domain_student::{
    ClassPlacement, Enrollment, EnrollmentStatus, PromotionStatus, Student,
};

use crate::adapters::students::fetch_student;
use crate::error::{map_sqlx_error, DatabaseError};

const ENROLLMENT_COLUMNS: &str = "id, student_id, academic_year_id, class_id, stream_id, \
    enrollment_status, promotion_status, enrollment_date, promoted_by, promotion_remarks, \
    promoted_at, final_average, created_at, updated_at";

#[derive(Debug, FromRow)]
struct EnrollmentRow {
    id: uuid::Uuid,
    student_id: uuid::Uuid,
    academic_year_id: uuid::Uuid,
    class_id: uuid::Uuid,
    stream_id: uuid::Uuid,
    enrollment_status: String,
    promotion_status: String,
    enrollment_date: NaiveDate,
    promoted_by: Option<uuid::Uuid>,
    promotion_remarks: Option<String>,
    promoted_at: Option<DateTime<Utc>>,
    final_average: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn enrollment_from_row(row: EnrollmentRow) -> Result<Enrollment, DatabaseError> {
    Ok(Enrollment {
        id: EnrollmentId::from(row.id),
        student_id: StudentId::from(row.student_id),
        academic_year_id: AcademicYearId::from(row.academic_year_id),
        class_id: ClassId::from(row.class_id),
        stream_id: StreamId::from(row.stream_id),
        enrollment_status: EnrollmentStatus::from_str(&row.enrollment_status)
            .map_err(DatabaseError::invalid_value)?,
        promotion_status: PromotionStatus::from_str(&row.promotion_status)
            .map_err(DatabaseError::invalid_value)?,
        enrollment_date: row.enrollment_date,
        promoted_by: row.promoted_by.map(StaffId::from),
        promotion_remarks: row.promotion_remarks,
        promoted_at: row.promoted_at,
        final_average: row.final_average,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// PostgreSQL-backed implementation of the [`PromotionStore`] port
#[derive(Debug, Clone)]
pub struct PostgresPromotionStore {
    pool: PgPool,
}

impl PostgresPromotionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn close_enrollment(
        tx: &mut Transaction<'_, Postgres>,
        enrollment: &Enrollment,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE enrollments SET enrollment_status = $2, promotion_status = $3, \
                    promoted_by = $4, promotion_remarks = $5, promoted_at = $6, updated_at = $7 \
             WHERE id = $1",
        )
        .bind(uuid::Uuid::from(enrollment.id))
        .bind(enrollment.enrollment_status.as_str())
        .bind(enrollment.promotion_status.as_str())
        .bind(enrollment.promoted_by.map(uuid::Uuid::from))
        .bind(&enrollment.promotion_remarks)
        .bind(enrollment.promoted_at)
        .bind(enrollment.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn insert_enrollment(
        tx: &mut Transaction<'_, Postgres>,
        enrollment: &Enrollment,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO enrollments (id, student_id, academic_year_id, class_id, stream_id, \
                    enrollment_status, promotion_status, enrollment_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(uuid::Uuid::from(enrollment.id))
        .bind(uuid::Uuid::from(enrollment.student_id))
        .bind(uuid::Uuid::from(enrollment.academic_year_id))
        .bind(uuid::Uuid::from(enrollment.class_id))
        .bind(uuid::Uuid::from(enrollment.stream_id))
        .bind(enrollment.enrollment_status.as_str())
        .bind(enrollment.promotion_status.as_str())
        .bind(enrollment.enrollment_date)
        .bind(enrollment.created_at)
        .bind(enrollment.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

impl DomainPort for PostgresPromotionStore {}

#[async_trait]
impl HealthCheckable for PostgresPromotionStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-promotion-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-promotion-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl PromotionStore for PostgresPromotionStore {
    #[instrument(skip(self), fields(student_id = %id))]
    async fn get_student(&self, id: StudentId) -> Result<Student, PortError> {
        debug!("Fetching student by id");
        Ok(fetch_student(&self.pool, id).await?)
    }

    #[instrument(skip(self), fields(student_id = %student_id, year_id = %year_id))]
    async fn current_enrollment(
        &self,
        student_id: StudentId,
        year_id: AcademicYearId,
    ) -> Result<Option<Enrollment>, PortError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {} FROM enrollments WHERE student_id = $1 AND academic_year_id = $2",
            ENROLLMENT_COLUMNS
        ))
        .bind(uuid::Uuid::from(student_id))
        .bind(uuid::Uuid::from(year_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(enrollment_from_row).transpose()?)
    }

    #[instrument(skip(self), fields(class_id = %class_id, stream_id = %stream_id))]
    async fn class_stream_exists(
        &self,
        class_id: ClassId,
        stream_id: StreamId,
    ) -> Result<bool, PortError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
                SELECT 1 FROM class_streams cs \
                JOIN school_classes c ON c.id = cs.class_id \
                WHERE cs.id = $2 AND cs.class_id = $1 AND cs.is_active AND c.is_active)",
        )
        .bind(uuid::Uuid::from(class_id))
        .bind(uuid::Uuid::from(stream_id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    #[instrument(skip(self), fields(class_id = %class_id, stream_id = %stream_id))]
    async fn class_label(
        &self,
        class_id: ClassId,
        stream_id: StreamId,
    ) -> Result<Option<String>, PortError> {
        let label = sqlx::query_scalar::<_, String>(
            "SELECT c.name || ' ' || cs.name FROM class_streams cs \
             JOIN school_classes c ON c.id = cs.class_id \
             WHERE cs.id = $2 AND cs.class_id = $1",
        )
        .bind(uuid::Uuid::from(class_id))
        .bind(uuid::Uuid::from(stream_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(label)
    }

    #[instrument(skip(self), fields(class_id = %class_id, stream_id = %stream_id, year_id = %year_id))]
    async fn pending_students(
        &self,
        class_id: ClassId,
        stream_id: StreamId,
        year_id: AcademicYearId,
    ) -> Result<Vec<Enrollment>, PortError> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {} FROM enrollments \
             WHERE class_id = $1 AND stream_id = $2 AND academic_year_id = $3 \
               AND promotion_status = 'pending' \
               AND enrollment_status IN ('enrolled', 'active') \
             ORDER BY created_at",
            ENROLLMENT_COLUMNS
        ))
        .bind(uuid::Uuid::from(class_id))
        .bind(uuid::Uuid::from(stream_id))
        .bind(uuid::Uuid::from(year_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| enrollment_from_row(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, placement), fields(class_id = %placement.class_id, year_id = %placement.academic_year_id))]
    async fn upsert_class_placement(&self, placement: &ClassPlacement) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO class_placements (class_id, stream_id, academic_year_id, \
                    class_teacher_id, classroom, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (class_id, stream_id, academic_year_id) DO UPDATE SET \
                    class_teacher_id = EXCLUDED.class_teacher_id, \
                    classroom = EXCLUDED.classroom, updated_at = EXCLUDED.updated_at",
        )
        .bind(uuid::Uuid::from(placement.class_id))
        .bind(uuid::Uuid::from(placement.stream_id))
        .bind(uuid::Uuid::from(placement.academic_year_id))
        .bind(placement.class_teacher_id.map(uuid::Uuid::from))
        .bind(&placement.classroom)
        .bind(placement.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self, batch), fields(batch_name = %batch.batch_name))]
    async fn insert_batch(&self, batch: &PromotionBatch) -> Result<(), PortError> {
        debug!("Inserting promotion batch");
        sqlx::query(
            "INSERT INTO promotion_batches (id, batch_name, from_year_id, to_year_id, \
                    promotion_type, total_students, promoted_count, retained_count, \
                    graduated_count, failed_count, initiated_by, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(uuid::Uuid::from(batch.id))
        .bind(&batch.batch_name)
        .bind(uuid::Uuid::from(batch.from_year_id))
        .bind(uuid::Uuid::from(batch.to_year_id))
        .bind(batch.promotion_type.as_str())
        .bind(batch.total_students as i32)
        .bind(batch.promoted_count as i32)
        .bind(batch.retained_count as i32)
        .bind(batch.graduated_count as i32)
        .bind(batch.failed_count as i32)
        .bind(uuid::Uuid::from(batch.initiated_by))
        .bind(batch.status.as_str())
        .bind(batch.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self, batch), fields(batch_id = %batch.id))]
    async fn update_batch(&self, batch: &PromotionBatch) -> Result<(), PortError> {
        sqlx::query(
            "UPDATE promotion_batches SET total_students = $2, promoted_count = $3, \
                    retained_count = $4, graduated_count = $5, failed_count = $6, \
                    status = $7, completed_at = $8 \
             WHERE id = $1",
        )
        .bind(uuid::Uuid::from(batch.id))
        .bind(batch.total_students as i32)
        .bind(batch.promoted_count as i32)
        .bind(batch.retained_count as i32)
        .bind(batch.graduated_count as i32)
        .bind(batch.failed_count as i32)
        .bind(batch.status.as_str())
        .bind(batch.completed_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self, current, next, record), fields(student_id = %record.student_id))]
    async fn apply_promotion(
        &self,
        current: &Enrollment,
        next: &Enrollment,
        record: &PromotionRecord,
    ) -> Result<(), PortError> {
        debug!("Applying promotion for one student");
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        Self::close_enrollment(&mut tx, current).await?;
        Self::insert_enrollment(&mut tx, next).await?;

        sqlx::query(
            "INSERT INTO promotion_records (id, batch_id, student_id, from_enrollment_id, \
                    to_enrollment_id, from_class_id, to_class_id, promotion_date, promoted_by, \
                    remarks, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(uuid::Uuid::from(record.id))
        .bind(record.batch_id.map(uuid::Uuid::from))
        .bind(uuid::Uuid::from(record.student_id))
        .bind(uuid::Uuid::from(record.from_enrollment_id))
        .bind(uuid::Uuid::from(record.to_enrollment_id))
        .bind(uuid::Uuid::from(record.from_class_id))
        .bind(uuid::Uuid::from(record.to_class_id))
        .bind(record.promotion_date)
        .bind(uuid::Uuid::from(record.promoted_by))
        .bind(&record.remarks)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    #[instrument(skip(self, enrollment, alumni), fields(student_id = %alumni.student_id))]
    async fn apply_graduation(
        &self,
        enrollment: &Enrollment,
        alumni: &Alumni,
    ) -> Result<(), PortError> {
        debug!("Applying graduation for one student");
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        Self::close_enrollment(&mut tx, enrollment).await?;

        sqlx::query(
            "INSERT INTO alumni (id, student_id, graduation_date, final_class_id, \
                    final_stream_id, academic_year_id, final_average, awards, honors, \
                    next_destination, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(uuid::Uuid::from(alumni.id))
        .bind(uuid::Uuid::from(alumni.student_id))
        .bind(alumni.graduation_date)
        .bind(uuid::Uuid::from(alumni.final_class_id))
        .bind(uuid::Uuid::from(alumni.final_stream_id))
        .bind(uuid::Uuid::from(alumni.academic_year_id))
        .bind(alumni.final_average)
        .bind(&alumni.awards)
        .bind(&alumni.honors)
        .bind(&alumni.next_destination)
        .bind(alumni.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
