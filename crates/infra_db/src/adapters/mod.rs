//! PostgreSQL adapters for the domain ports

mod students;

pub mod calendar;
pub mod checks;
pub mod numbering;
pub mod promotion;
pub mod readmission;
pub mod transfer;

pub use calendar::PostgresAcademicCalendar;
pub use checks::{FinanceFeeCheck, LibraryLoanCheck};
pub use numbering::PostgresNumberGenerator;
pub use promotion::PostgresPromotionStore;
pub use readmission::PostgresReAdmissionStore;
pub use transfer::PostgresTransferStore;
