//! PostgreSQL Transfer Store
//!
//! Implements [`TransferStore`] against the `student_transfers`,
//! `transfer_clearances`, and `clearance_departments` tables. The partial
//! unique index over non-terminal statuses makes a second open transfer for
//! a student impossible even under concurrent callers; the engine's
//! pre-check only exists to give a friendlier error.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, ClassId, ClearanceRecordId, DepartmentId, DomainPort, HealthCheckResult,
    HealthCheckable, PortError, StaffId, StreamId, StudentId, TransferId,
};
use domain_student::Student;
use domain_transfer::{
    ClearanceDepartment, ClearanceRecord, ClearanceStatus, Transfer, TransferStatus, TransferType,
    TransferStore,
};

use crate::adapters::students::{fetch_student, persist_student};
use crate::error::{map_sqlx_error, DatabaseError};

const TRANSFER_COLUMNS: &str = "id, transfer_no, student_id, transfer_type, from_class_id, \
    from_stream_id, destination_school, destination_school_code, destination_class_id, \
    destination_stream_id, reason, status, requested_by, request_date, approved_by, \
    approval_date, approval_notes, rejection_reason, cancellation_reason, \
    leaving_certificate_no, leaving_certificate_path, clearance_form_path, effective_date, \
    completed_at, created_at, updated_at";

const CLEARANCE_COLUMNS: &str = "id, transfer_id, department_id, department_code, status, \
    has_issues, issue_description, outstanding_amount, resolution_notes, waiver_granted, \
    waiver_reason, waiver_granted_by, cleared_by, cleared_at, created_at, updated_at";

#[derive(Debug, FromRow)]
struct TransferRow {
    id: uuid::Uuid,
    transfer_no: String,
    student_id: uuid::Uuid,
    transfer_type: String,
    from_class_id: Option<uuid::Uuid>,
    from_stream_id: Option<uuid::Uuid>,
    destination_school: Option<String>,
    destination_school_code: Option<String>,
    destination_class_id: Option<uuid::Uuid>,
    destination_stream_id: Option<uuid::Uuid>,
    reason: String,
    status: String,
    requested_by: uuid::Uuid,
    request_date: NaiveDate,
    approved_by: Option<uuid::Uuid>,
    approval_date: Option<DateTime<Utc>>,
    approval_notes: Option<String>,
    rejection_reason: Option<String>,
    cancellation_reason: Option<String>,
    leaving_certificate_no: Option<String>,
    leaving_certificate_path: Option<String>,
    clearance_form_path: Option<String>,
    effective_date: Option<NaiveDate>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ClearanceRow {
    id: uuid::Uuid,
    transfer_id: uuid::Uuid,
    department_id: uuid::Uuid,
    department_code: String,
    status: String,
    has_issues: bool,
    issue_description: Option<String>,
    outstanding_amount: Decimal,
    resolution_notes: Option<String>,
    waiver_granted: bool,
    waiver_reason: Option<String>,
    waiver_granted_by: Option<uuid::Uuid>,
    cleared_by: Option<uuid::Uuid>,
    cleared_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DepartmentRow {
    id: uuid::Uuid,
    code: String,
    name: String,
    description: Option<String>,
    is_mandatory: bool,
    sort_order: i16,
    is_active: bool,
}

fn transfer_from_row(row: TransferRow) -> Result<Transfer, DatabaseError> {
    Ok(Transfer {
        id: TransferId::from(row.id),
        transfer_no: row.transfer_no,
        student_id: StudentId::from(row.student_id),
        transfer_type: TransferType::from_str(&row.transfer_type)
            .map_err(DatabaseError::invalid_value)?,
        from_class_id: row.from_class_id.map(ClassId::from),
        from_stream_id: row.from_stream_id.map(StreamId::from),
        destination_school: row.destination_school,
        destination_school_code: row.destination_school_code,
        destination_class_id: row.destination_class_id.map(ClassId::from),
        destination_stream_id: row.destination_stream_id.map(StreamId::from),
        reason: row.reason,
        status: TransferStatus::from_str(&row.status).map_err(DatabaseError::invalid_value)?,
        requested_by: StaffId::from(row.requested_by),
        request_date: row.request_date,
        approved_by: row.approved_by.map(StaffId::from),
        approval_date: row.approval_date,
        approval_notes: row.approval_notes,
        rejection_reason: row.rejection_reason,
        cancellation_reason: row.cancellation_reason,
        leaving_certificate_no: row.leaving_certificate_no,
        leaving_certificate_path: row.leaving_certificate_path,
        clearance_form_path: row.clearance_form_path,
        effective_date: row.effective_date,
        completed_at: row.completed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn clearance_from_row(row: ClearanceRow) -> Result<ClearanceRecord, DatabaseError> {
    Ok(ClearanceRecord {
        id: ClearanceRecordId::from(row.id),
        transfer_id: TransferId::from(row.transfer_id),
        department_id: DepartmentId::from(row.department_id),
        department_code: row.department_code,
        status: ClearanceStatus::from_str(&row.status).map_err(DatabaseError::invalid_value)?,
        has_issues: row.has_issues,
        issue_description: row.issue_description,
        outstanding_amount: row.outstanding_amount,
        resolution_notes: row.resolution_notes,
        waiver_granted: row.waiver_granted,
        waiver_reason: row.waiver_reason,
        waiver_granted_by: row.waiver_granted_by.map(StaffId::from),
        cleared_by: row.cleared_by.map(StaffId::from),
        cleared_at: row.cleared_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn department_from_row(row: DepartmentRow) -> ClearanceDepartment {
    ClearanceDepartment {
        id: DepartmentId::from(row.id),
        code: row.code,
        name: row.name,
        description: row.description,
        is_mandatory: row.is_mandatory,
        sort_order: row.sort_order,
        is_active: row.is_active,
    }
}

/// PostgreSQL-backed implementation of the [`TransferStore`] port
#[derive(Debug, Clone)]
pub struct PostgresTransferStore {
    pool: PgPool,
}

impl PostgresTransferStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_transfer(
        tx: &mut Transaction<'_, Postgres>,
        transfer: &Transfer,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE student_transfers SET status = $2, approved_by = $3, approval_date = $4, \
                    approval_notes = $5, rejection_reason = $6, cancellation_reason = $7, \
                    leaving_certificate_no = $8, leaving_certificate_path = $9, \
                    clearance_form_path = $10, effective_date = $11, completed_at = $12, \
                    updated_at = $13 \
             WHERE id = $1",
        )
        .bind(uuid::Uuid::from(transfer.id))
        .bind(transfer.status.as_str())
        .bind(transfer.approved_by.map(uuid::Uuid::from))
        .bind(transfer.approval_date)
        .bind(&transfer.approval_notes)
        .bind(&transfer.rejection_reason)
        .bind(&transfer.cancellation_reason)
        .bind(&transfer.leaving_certificate_no)
        .bind(&transfer.leaving_certificate_path)
        .bind(&transfer.clearance_form_path)
        .bind(transfer.effective_date)
        .bind(transfer.completed_at)
        .bind(transfer.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn write_clearance(
        tx: &mut Transaction<'_, Postgres>,
        record: &ClearanceRecord,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO transfer_clearances (id, transfer_id, department_id, department_code, \
                    status, has_issues, issue_description, outstanding_amount, resolution_notes, \
                    waiver_granted, waiver_reason, waiver_granted_by, cleared_by, cleared_at, \
                    created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             ON CONFLICT (transfer_id, department_id) DO UPDATE SET \
                    status = EXCLUDED.status, has_issues = EXCLUDED.has_issues, \
                    issue_description = EXCLUDED.issue_description, \
                    outstanding_amount = EXCLUDED.outstanding_amount, \
                    resolution_notes = EXCLUDED.resolution_notes, \
                    waiver_granted = EXCLUDED.waiver_granted, \
                    waiver_reason = EXCLUDED.waiver_reason, \
                    waiver_granted_by = EXCLUDED.waiver_granted_by, \
                    cleared_by = EXCLUDED.cleared_by, cleared_at = EXCLUDED.cleared_at, \
                    updated_at = EXCLUDED.updated_at",
        )
        .bind(uuid::Uuid::from(record.id))
        .bind(uuid::Uuid::from(record.transfer_id))
        .bind(uuid::Uuid::from(record.department_id))
        .bind(&record.department_code)
        .bind(record.status.as_str())
        .bind(record.has_issues)
        .bind(&record.issue_description)
        .bind(record.outstanding_amount)
        .bind(&record.resolution_notes)
        .bind(record.waiver_granted)
        .bind(&record.waiver_reason)
        .bind(record.waiver_granted_by.map(uuid::Uuid::from))
        .bind(record.cleared_by.map(uuid::Uuid::from))
        .bind(record.cleared_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

impl DomainPort for PostgresTransferStore {}

#[async_trait]
impl HealthCheckable for PostgresTransferStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-transfer-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-transfer-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl TransferStore for PostgresTransferStore {
    #[instrument(skip(self), fields(student_id = %id))]
    async fn get_student(&self, id: StudentId) -> Result<Student, PortError> {
        debug!("Fetching student by id");
        Ok(fetch_student(&self.pool, id).await?)
    }

    #[instrument(skip(self), fields(transfer_id = %id))]
    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, PortError> {
        debug!("Fetching transfer by id");
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            "SELECT {} FROM student_transfers WHERE id = $1",
            TRANSFER_COLUMNS
        ))
        .bind(uuid::Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| DatabaseError::not_found("Transfer", id))?;

        Ok(transfer_from_row(row)?)
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    async fn find_open_transfer(
        &self,
        student_id: StudentId,
    ) -> Result<Option<Transfer>, PortError> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            "SELECT {} FROM student_transfers \
             WHERE student_id = $1 AND status NOT IN ('completed', 'rejected', 'cancelled')",
            TRANSFER_COLUMNS
        ))
        .bind(uuid::Uuid::from(student_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(transfer_from_row).transpose()?)
    }

    #[instrument(skip(self))]
    async fn active_departments(&self) -> Result<Vec<ClearanceDepartment>, PortError> {
        let rows = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, code, name, description, is_mandatory, sort_order, is_active \
             FROM clearance_departments WHERE is_active ORDER BY sort_order, code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(department_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn department_by_code(
        &self,
        code: &str,
    ) -> Result<Option<ClearanceDepartment>, PortError> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, code, name, description, is_mandatory, sort_order, is_active \
             FROM clearance_departments WHERE code = $1 AND is_active",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(department_from_row))
    }

    #[instrument(skip(self, transfer, clearances), fields(transfer_no = %transfer.transfer_no, clearances = clearances.len()))]
    async fn insert_transfer(
        &self,
        transfer: &Transfer,
        clearances: &[ClearanceRecord],
    ) -> Result<(), PortError> {
        debug!("Inserting transfer with initial clearance records");
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO student_transfers (id, transfer_no, student_id, transfer_type, \
                    from_class_id, from_stream_id, destination_school, destination_school_code, \
                    destination_class_id, destination_stream_id, reason, status, requested_by, \
                    request_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(uuid::Uuid::from(transfer.id))
        .bind(&transfer.transfer_no)
        .bind(uuid::Uuid::from(transfer.student_id))
        .bind(transfer.transfer_type.as_str())
        .bind(transfer.from_class_id.map(uuid::Uuid::from))
        .bind(transfer.from_stream_id.map(uuid::Uuid::from))
        .bind(&transfer.destination_school)
        .bind(&transfer.destination_school_code)
        .bind(transfer.destination_class_id.map(uuid::Uuid::from))
        .bind(transfer.destination_stream_id.map(uuid::Uuid::from))
        .bind(&transfer.reason)
        .bind(transfer.status.as_str())
        .bind(uuid::Uuid::from(transfer.requested_by))
        .bind(transfer.request_date)
        .bind(transfer.created_at)
        .bind(transfer.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        for record in clearances {
            Self::write_clearance(&mut tx, record).await?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    #[instrument(skip(self, transfer), fields(transfer_id = %transfer.id))]
    async fn update_transfer(&self, transfer: &Transfer) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Self::write_transfer(&mut tx, transfer).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(transfer_id = %transfer_id))]
    async fn clearances_for(
        &self,
        transfer_id: TransferId,
    ) -> Result<Vec<ClearanceRecord>, PortError> {
        let rows = sqlx::query_as::<_, ClearanceRow>(&format!(
            "SELECT c.{} FROM transfer_clearances c \
             JOIN clearance_departments d ON d.id = c.department_id \
             WHERE c.transfer_id = $1 ORDER BY d.sort_order, d.code",
            CLEARANCE_COLUMNS.replace(", ", ", c.")
        ))
        .bind(uuid::Uuid::from(transfer_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| clearance_from_row(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self), fields(transfer_id = %transfer_id, department_id = %department_id))]
    async fn clearance_for_department(
        &self,
        transfer_id: TransferId,
        department_id: DepartmentId,
    ) -> Result<Option<ClearanceRecord>, PortError> {
        let row = sqlx::query_as::<_, ClearanceRow>(&format!(
            "SELECT {} FROM transfer_clearances WHERE transfer_id = $1 AND department_id = $2",
            CLEARANCE_COLUMNS
        ))
        .bind(uuid::Uuid::from(transfer_id))
        .bind(uuid::Uuid::from(department_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(clearance_from_row).transpose()?)
    }

    #[instrument(skip(self, record, transfer), fields(transfer_id = %record.transfer_id, department = %record.department_code))]
    async fn save_clearance(
        &self,
        record: &ClearanceRecord,
        transfer: Option<&Transfer>,
    ) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Self::write_clearance(&mut tx, record).await?;
        if let Some(transfer) = transfer {
            Self::write_transfer(&mut tx, transfer).await?;
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    #[instrument(skip(self, transfer, student), fields(transfer_no = %transfer.transfer_no))]
    async fn complete_transfer(
        &self,
        transfer: &Transfer,
        student: &Student,
    ) -> Result<(), PortError> {
        debug!("Completing transfer and updating the student record");
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Self::write_transfer(&mut tx, transfer).await?;
        persist_student(&mut *tx, student).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
