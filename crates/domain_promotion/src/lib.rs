//! Promotion Domain
//!
//! Year-end promotion and graduation processing. One atomic single-student
//! primitive underpins four batch shapes: a picked set of students, an
//! entire class, a whole-school run over a class mapping, and final-grade
//! graduation into the alumni register.

pub mod batch;
pub mod alumni;
pub mod engine;
pub mod ports;
pub mod error;

pub use batch::{
    BatchOutcome, BatchStatus, PromotionBatch, PromotionFailure, PromotionRecord, PromotionType,
};
pub use alumni::{Alumni, GraduationDetails};
pub use engine::{
    BulkOutcome, ClassAssignment, ClassPromotionMapping, ClassPromotionResult, GraduationOutcome,
    PromotionEngine, PromotionTarget,
};
pub use ports::PromotionStore;
pub use error::PromotionError;
