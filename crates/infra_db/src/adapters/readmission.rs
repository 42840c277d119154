//! PostgreSQL Re-Admission Store
//!
//! Implements [`ReAdmissionStore`] against the `readmissions` table. The
//! outstanding balance snapshot comes from `student_fees` at submission time.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, ClassId, DomainPort, GuardianId, HealthCheckResult, HealthCheckable, PortError,
    ReAdmissionId, StaffId, StreamId, StudentId,
};
use domain_readmission::{ReAdmission, ReAdmissionStatus, ReAdmissionStore};
use domain_student::{Student, StudentStatus};

use crate::adapters::students::{fetch_student, persist_student};
use crate::error::{map_sqlx_error, DatabaseError};

const READMISSION_COLUMNS: &str = "id, readmission_no, student_id, previous_status, \
    previous_class_id, previous_stream_id, exit_date, exit_reason, target_class_id, \
    target_stream_id, readmission_date, reason, guardian_id, previous_fee_balance, status, \
    reviewed_by, reviewed_at, review_notes, approved_by, approval_date, approval_notes, \
    rejection_reason, fee_waiver_granted, fee_waiver_amount, fee_waiver_reason, completed_at, \
    created_at, updated_at";

#[derive(Debug, FromRow)]
struct ReAdmissionRow {
    id: uuid::Uuid,
    readmission_no: String,
    student_id: uuid::Uuid,
    previous_status: String,
    previous_class_id: Option<uuid::Uuid>,
    previous_stream_id: Option<uuid::Uuid>,
    exit_date: Option<NaiveDate>,
    exit_reason: Option<String>,
    target_class_id: uuid::Uuid,
    target_stream_id: uuid::Uuid,
    readmission_date: NaiveDate,
    reason: String,
    guardian_id: Option<uuid::Uuid>,
    previous_fee_balance: Decimal,
    status: String,
    reviewed_by: Option<uuid::Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    review_notes: Option<String>,
    approved_by: Option<uuid::Uuid>,
    approval_date: Option<DateTime<Utc>>,
    approval_notes: Option<String>,
    rejection_reason: Option<String>,
    fee_waiver_granted: bool,
    fee_waiver_amount: Option<Decimal>,
    fee_waiver_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn readmission_from_row(row: ReAdmissionRow) -> Result<ReAdmission, DatabaseError> {
    Ok(ReAdmission {
        id: ReAdmissionId::from(row.id),
        readmission_no: row.readmission_no,
        student_id: StudentId::from(row.student_id),
        previous_status: StudentStatus::from_str(&row.previous_status)
            .map_err(DatabaseError::invalid_value)?,
        previous_class_id: row.previous_class_id.map(ClassId::from),
        previous_stream_id: row.previous_stream_id.map(StreamId::from),
        exit_date: row.exit_date,
        exit_reason: row.exit_reason,
        target_class_id: ClassId::from(row.target_class_id),
        target_stream_id: StreamId::from(row.target_stream_id),
        readmission_date: row.readmission_date,
        reason: row.reason,
        guardian_id: row.guardian_id.map(GuardianId::from),
        previous_fee_balance: row.previous_fee_balance,
        status: ReAdmissionStatus::from_str(&row.status).map_err(DatabaseError::invalid_value)?,
        reviewed_by: row.reviewed_by.map(StaffId::from),
        reviewed_at: row.reviewed_at,
        review_notes: row.review_notes,
        approved_by: row.approved_by.map(StaffId::from),
        approval_date: row.approval_date,
        approval_notes: row.approval_notes,
        rejection_reason: row.rejection_reason,
        fee_waiver_granted: row.fee_waiver_granted,
        fee_waiver_amount: row.fee_waiver_amount,
        fee_waiver_reason: row.fee_waiver_reason,
        completed_at: row.completed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// PostgreSQL-backed implementation of the [`ReAdmissionStore`] port
#[derive(Debug, Clone)]
pub struct PostgresReAdmissionStore {
    pool: PgPool,
}

impl PostgresReAdmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_readmission<'e, E>(
        executor: E,
        readmission: &ReAdmission,
    ) -> Result<(), DatabaseError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            "UPDATE readmissions SET status = $2, reviewed_by = $3, reviewed_at = $4, \
                    review_notes = $5, approved_by = $6, approval_date = $7, \
                    approval_notes = $8, rejection_reason = $9, fee_waiver_granted = $10, \
                    fee_waiver_amount = $11, fee_waiver_reason = $12, completed_at = $13, \
                    updated_at = $14 \
             WHERE id = $1",
        )
        .bind(uuid::Uuid::from(readmission.id))
        .bind(readmission.status.as_str())
        .bind(readmission.reviewed_by.map(uuid::Uuid::from))
        .bind(readmission.reviewed_at)
        .bind(&readmission.review_notes)
        .bind(readmission.approved_by.map(uuid::Uuid::from))
        .bind(readmission.approval_date)
        .bind(&readmission.approval_notes)
        .bind(&readmission.rejection_reason)
        .bind(readmission.fee_waiver_granted)
        .bind(readmission.fee_waiver_amount)
        .bind(&readmission.fee_waiver_reason)
        .bind(readmission.completed_at)
        .bind(readmission.updated_at)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

impl DomainPort for PostgresReAdmissionStore {}

#[async_trait]
impl HealthCheckable for PostgresReAdmissionStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-readmission-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-readmission-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl ReAdmissionStore for PostgresReAdmissionStore {
    #[instrument(skip(self), fields(student_id = %id))]
    async fn get_student(&self, id: StudentId) -> Result<Student, PortError> {
        debug!("Fetching student by id");
        Ok(fetch_student(&self.pool, id).await?)
    }

    #[instrument(skip(self), fields(readmission_id = %id))]
    async fn get_readmission(&self, id: ReAdmissionId) -> Result<ReAdmission, PortError> {
        debug!("Fetching re-admission by id");
        let row = sqlx::query_as::<_, ReAdmissionRow>(&format!(
            "SELECT {} FROM readmissions WHERE id = $1",
            READMISSION_COLUMNS
        ))
        .bind(uuid::Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| DatabaseError::not_found("ReAdmission", id))?;

        Ok(readmission_from_row(row)?)
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    async fn find_open_readmission(
        &self,
        student_id: StudentId,
    ) -> Result<Option<ReAdmission>, PortError> {
        let row = sqlx::query_as::<_, ReAdmissionRow>(&format!(
            "SELECT {} FROM readmissions \
             WHERE student_id = $1 AND status NOT IN ('rejected', 'completed')",
            READMISSION_COLUMNS
        ))
        .bind(uuid::Uuid::from(student_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(readmission_from_row).transpose()?)
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    async fn outstanding_balance(&self, student_id: StudentId) -> Result<Decimal, PortError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(balance), 0) FROM student_fees WHERE student_id = $1",
        )
        .bind(uuid::Uuid::from(student_id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(balance)
    }

    #[instrument(skip(self, readmission), fields(readmission_no = %readmission.readmission_no))]
    async fn insert_readmission(&self, readmission: &ReAdmission) -> Result<(), PortError> {
        debug!("Inserting re-admission");
        sqlx::query(
            "INSERT INTO readmissions (id, readmission_no, student_id, previous_status, \
                    previous_class_id, previous_stream_id, exit_date, exit_reason, \
                    target_class_id, target_stream_id, readmission_date, reason, guardian_id, \
                    previous_fee_balance, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(uuid::Uuid::from(readmission.id))
        .bind(&readmission.readmission_no)
        .bind(uuid::Uuid::from(readmission.student_id))
        .bind(readmission.previous_status.as_str())
        .bind(readmission.previous_class_id.map(uuid::Uuid::from))
        .bind(readmission.previous_stream_id.map(uuid::Uuid::from))
        .bind(readmission.exit_date)
        .bind(&readmission.exit_reason)
        .bind(uuid::Uuid::from(readmission.target_class_id))
        .bind(uuid::Uuid::from(readmission.target_stream_id))
        .bind(readmission.readmission_date)
        .bind(&readmission.reason)
        .bind(readmission.guardian_id.map(uuid::Uuid::from))
        .bind(readmission.previous_fee_balance)
        .bind(readmission.status.as_str())
        .bind(readmission.created_at)
        .bind(readmission.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self, readmission), fields(readmission_id = %readmission.id))]
    async fn update_readmission(&self, readmission: &ReAdmission) -> Result<(), PortError> {
        Self::write_readmission(&self.pool, readmission).await?;
        Ok(())
    }

    #[instrument(skip(self, readmission, student), fields(readmission_no = %readmission.readmission_no))]
    async fn complete_readmission(
        &self,
        readmission: &ReAdmission,
        student: &Student,
    ) -> Result<(), PortError> {
        debug!("Completing re-admission and reactivating the student");
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Self::write_readmission(&mut *tx, readmission).await?;
        persist_student(&mut *tx, student).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
