//! Reference number generation
//!
//! Transfers, re-admissions, and leaving certificates carry human-readable
//! reference numbers. Formatting and uniqueness are the generator's problem,
//! not the engines': the database implementation draws from sequences, the
//! mock from an atomic counter.

use async_trait::async_trait;

use crate::ports::PortError;

/// Generates unique reference numbers for lifecycle documents
#[async_trait]
pub trait ReferenceNumberGenerator: Send + Sync {
    /// Next transfer number, e.g. `TRF-2026-00042`
    async fn transfer_number(&self) -> Result<String, PortError>;

    /// Next re-admission number, e.g. `RADM-2026-0007`
    async fn readmission_number(&self) -> Result<String, PortError>;

    /// Next leaving certificate number for the given year, e.g. `LC-2026-0015`
    async fn certificate_number(&self, year: i32) -> Result<String, PortError>;
}

/// Counter-backed generator for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Datelike;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// In-memory generator backed by a single atomic counter
    #[derive(Debug, Default)]
    pub struct CountingNumberGenerator {
        counter: AtomicU64,
    }

    impl CountingNumberGenerator {
        pub fn new() -> Self {
            Self::default()
        }

        fn next(&self) -> u64 {
            self.counter.fetch_add(1, Ordering::SeqCst) + 1
        }
    }

    #[async_trait]
    impl ReferenceNumberGenerator for CountingNumberGenerator {
        async fn transfer_number(&self) -> Result<String, PortError> {
            let year = chrono::Utc::now().year();
            Ok(format!("TRF-{}-{:05}", year, self.next()))
        }

        async fn readmission_number(&self) -> Result<String, PortError> {
            let year = chrono::Utc::now().year();
            Ok(format!("RADM-{}-{:04}", year, self.next()))
        }

        async fn certificate_number(&self, year: i32) -> Result<String, PortError> {
            Ok(format!("LC-{}-{:04}", year, self.next()))
        }
    }
}
