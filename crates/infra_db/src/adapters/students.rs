//! Shared student row mapping
//!
//! Every lifecycle workflow reads and updates student records; the helpers
//! here take any executor so they work both on the pool and inside a
//! transaction.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use core_kernel::{ClassId, StreamId, StudentId};
use domain_student::{Student, StudentStatus};

use crate::error::{map_sqlx_error, DatabaseError};

#[derive(Debug, FromRow)]
pub(crate) struct StudentRow {
    pub id: Uuid,
    pub admission_no: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub class_id: Option<Uuid>,
    pub stream_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn student_from_row(row: StudentRow) -> Result<Student, DatabaseError> {
    Ok(Student {
        id: StudentId::from(row.id),
        admission_no: row.admission_no,
        first_name: row.first_name,
        last_name: row.last_name,
        status: StudentStatus::from_str(&row.status).map_err(DatabaseError::invalid_value)?,
        class_id: row.class_id.map(ClassId::from),
        stream_id: row.stream_id.map(StreamId::from),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub(crate) async fn fetch_student<'e, E>(
    executor: E,
    id: StudentId,
) -> Result<Student, DatabaseError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, StudentRow>(
        "SELECT id, admission_no, first_name, last_name, status, class_id, stream_id, \
                created_at, updated_at \
         FROM students WHERE id = $1",
    )
    .bind(Uuid::from(id))
    .fetch_optional(executor)
    .await
    .map_err(map_sqlx_error)?
    .ok_or_else(|| DatabaseError::not_found("Student", id))?;

    student_from_row(row)
}

/// Writes back the mutable student fields the lifecycle workflows change
pub(crate) async fn persist_student<'e, E>(
    executor: E,
    student: &Student,
) -> Result<(), DatabaseError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE students SET status = $2, class_id = $3, stream_id = $4, updated_at = $5 \
         WHERE id = $1",
    )
    .bind(Uuid::from(student.id))
    .bind(student.status.as_str())
    .bind(student.class_id.map(Uuid::from))
    .bind(student.stream_id.map(Uuid::from))
    .bind(student.updated_at)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}
