//! Shared test support: entity builders with sensible defaults and the
//! fixture data (departments, academic years) the integration suites reuse.

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
