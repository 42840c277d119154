//! Student domain ports

use async_trait::async_trait;

use core_kernel::{AcademicYearId, DomainPort, PortError};

use crate::academic::AcademicYear;

/// Resolves academic years
///
/// The promotion engine needs year codes for batch names and the current
/// year for defaults; it never manages years itself.
#[async_trait]
pub trait AcademicCalendar: DomainPort {
    /// Retrieves an academic year by id
    async fn get_year(&self, id: AcademicYearId) -> Result<AcademicYear, PortError>;

    /// Returns the school's current academic year
    async fn current_year(&self) -> Result<AcademicYear, PortError>;
}

/// In-memory calendar for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock implementation of [`AcademicCalendar`]
    #[derive(Debug, Default)]
    pub struct MockAcademicCalendar {
        years: Arc<RwLock<HashMap<AcademicYearId, AcademicYear>>>,
    }

    impl MockAcademicCalendar {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with years for testing
        pub async fn with_years(years: Vec<AcademicYear>) -> Self {
            let calendar = Self::new();
            for year in years {
                calendar.years.write().await.insert(year.id, year);
            }
            calendar
        }

        pub async fn insert_year(&self, year: AcademicYear) {
            self.years.write().await.insert(year.id, year);
        }
    }

    impl DomainPort for MockAcademicCalendar {}

    #[async_trait]
    impl AcademicCalendar for MockAcademicCalendar {
        async fn get_year(&self, id: AcademicYearId) -> Result<AcademicYear, PortError> {
            self.years
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("AcademicYear", id))
        }

        async fn current_year(&self) -> Result<AcademicYear, PortError> {
            self.years
                .read()
                .await
                .values()
                .find(|y| y.is_current)
                .cloned()
                .ok_or_else(|| PortError::not_found("AcademicYear", "current"))
        }
    }
}
