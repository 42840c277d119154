//! Infrastructure Database Layer
//!
//! PostgreSQL implementations of the domain storage ports using SQLx.
//! Each port method that touches more than one table runs inside a single
//! database transaction; the engines never compose transactions themselves.
//!
//! Uniqueness rules the domain relies on are enforced by the schema:
//! partial unique indexes guarantee at most one non-terminal transfer and
//! one non-terminal re-admission per student, and unique constraints cover
//! (transfer, department) clearance records and (student, academic year)
//! enrollments.

pub mod pool;
pub mod error;
pub mod adapters;

pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::{
    FinanceFeeCheck, LibraryLoanCheck, PostgresAcademicCalendar, PostgresNumberGenerator,
    PostgresPromotionStore, PostgresReAdmissionStore, PostgresTransferStore,
};
