//! PostgreSQL Academic Calendar

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use core_kernel::{AcademicYearId, DomainPort, PortError};
use domain_student::{AcademicCalendar, AcademicYear};

use crate::error::{map_sqlx_error, DatabaseError};

const YEAR_COLUMNS: &str = "id, year_code, year_name, start_date, end_date, is_current";

#[derive(Debug, FromRow)]
struct YearRow {
    id: uuid::Uuid,
    year_code: String,
    year_name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_current: bool,
}

fn year_from_row(row: YearRow) -> AcademicYear {
    AcademicYear {
        id: AcademicYearId::from(row.id),
        year_code: row.year_code,
        year_name: row.year_name,
        start_date: row.start_date,
        end_date: row.end_date,
        is_current: row.is_current,
    }
}

/// PostgreSQL-backed implementation of the [`AcademicCalendar`] port
#[derive(Debug, Clone)]
pub struct PostgresAcademicCalendar {
    pool: PgPool,
}

impl PostgresAcademicCalendar {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresAcademicCalendar {}

#[async_trait]
impl AcademicCalendar for PostgresAcademicCalendar {
    #[instrument(skip(self), fields(year_id = %id))]
    async fn get_year(&self, id: AcademicYearId) -> Result<AcademicYear, PortError> {
        debug!("Fetching academic year by id");
        let row = sqlx::query_as::<_, YearRow>(&format!(
            "SELECT {} FROM academic_years WHERE id = $1",
            YEAR_COLUMNS
        ))
        .bind(uuid::Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| DatabaseError::not_found("AcademicYear", id))?;

        Ok(year_from_row(row))
    }

    #[instrument(skip(self))]
    async fn current_year(&self) -> Result<AcademicYear, PortError> {
        let row = sqlx::query_as::<_, YearRow>(&format!(
            "SELECT {} FROM academic_years WHERE is_current",
            YEAR_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| DatabaseError::not_found("AcademicYear", "current"))?;

        Ok(year_from_row(row))
    }
}
