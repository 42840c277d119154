//! Request/Response data transfer objects

pub mod promotions;
pub mod readmissions;
pub mod transfers;
