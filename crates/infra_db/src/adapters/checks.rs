//! Database-backed clearance checks
//!
//! The checks registered for the FINANCE and LIBRARY department codes. Each
//! queries its department's tables directly; a query failure surfaces as
//! `CheckError::Unavailable`, which the transfer engine records on the
//! clearance item without failing the workflow.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{CheckError, CheckOutcome, EligibilityCheck, StudentId};

/// Verifies the student carries no outstanding fee balance
#[derive(Debug, Clone)]
pub struct FinanceFeeCheck {
    pool: PgPool,
}

impl FinanceFeeCheck {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EligibilityCheck for FinanceFeeCheck {
    fn name(&self) -> &str {
        "finance-fee-check"
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    async fn check(&self, student_id: StudentId) -> Result<CheckOutcome, CheckError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(balance), 0) FROM student_fees WHERE student_id = $1",
        )
        .bind(uuid::Uuid::from(student_id))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CheckError::unavailable(self.name(), e.to_string()))?;

        if balance > Decimal::ZERO {
            debug!(%balance, "Student has an outstanding fee balance");
            Ok(CheckOutcome::outstanding(
                balance,
                format!("Outstanding fee balance of {}", balance),
            ))
        } else {
            Ok(CheckOutcome::cleared())
        }
    }
}

/// Verifies the student has returned every borrowed library item
#[derive(Debug, Clone)]
pub struct LibraryLoanCheck {
    pool: PgPool,
}

impl LibraryLoanCheck {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EligibilityCheck for LibraryLoanCheck {
    fn name(&self) -> &str {
        "library-loan-check"
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    async fn check(&self, student_id: StudentId) -> Result<CheckOutcome, CheckError> {
        let unreturned = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM library_loans \
             WHERE student_id = $1 AND returned_at IS NULL",
        )
        .bind(uuid::Uuid::from(student_id))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CheckError::unavailable(self.name(), e.to_string()))?;

        if unreturned > 0 {
            debug!(unreturned, "Student has unreturned library items");
            Ok(CheckOutcome {
                is_cleared: false,
                outstanding_amount: Decimal::ZERO,
                description: Some(format!("{} unreturned library item(s)", unreturned)),
            })
        } else {
            Ok(CheckOutcome::cleared())
        }
    }
}
