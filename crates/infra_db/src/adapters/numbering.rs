//! Sequence-backed reference number generation

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{PortError, ReferenceNumberGenerator};

use crate::error::map_sqlx_error;

/// PostgreSQL implementation of [`ReferenceNumberGenerator`]
///
/// Each document type draws from its own sequence, so numbers are unique
/// under concurrent generation without any locking in the engines.
#[derive(Debug, Clone)]
pub struct PostgresNumberGenerator {
    pool: PgPool,
}

impl PostgresNumberGenerator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn next_value(&self, sequence: &str) -> Result<i64, PortError> {
        let value = sqlx::query_scalar::<_, i64>(&format!("SELECT nextval('{}')", sequence))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(value)
    }
}

#[async_trait]
impl ReferenceNumberGenerator for PostgresNumberGenerator {
    #[instrument(skip(self))]
    async fn transfer_number(&self) -> Result<String, PortError> {
        let next = self.next_value("transfer_no_seq").await?;
        Ok(format!("TRF-{}-{:05}", Utc::now().year(), next))
    }

    #[instrument(skip(self))]
    async fn readmission_number(&self) -> Result<String, PortError> {
        let next = self.next_value("readmission_no_seq").await?;
        Ok(format!("RADM-{}-{:04}", Utc::now().year(), next))
    }

    #[instrument(skip(self))]
    async fn certificate_number(&self, year: i32) -> Result<String, PortError> {
        let next = self.next_value("certificate_no_seq").await?;
        Ok(format!("LC-{}-{:04}", year, next))
    }
}
