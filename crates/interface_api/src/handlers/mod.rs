//! Request handlers

pub mod health;
pub mod promotions;
pub mod readmissions;
pub mod transfers;
