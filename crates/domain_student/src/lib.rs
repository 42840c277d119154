//! Student Domain
//!
//! Shared student-side model for the lifecycle engines: the student record
//! with its closed status enum, per-year enrollments with promotion state,
//! and the academic structure (years, classes, streams, placements).

pub mod student;
pub mod enrollment;
pub mod academic;
pub mod ports;
pub mod error;

pub use student::{Student, StudentStatus};
pub use enrollment::{Enrollment, EnrollmentStatus, PromotionStatus};
pub use academic::{AcademicYear, SchoolClass, ClassStream, ClassPlacement};
pub use ports::AcademicCalendar;
pub use error::StudentError;
