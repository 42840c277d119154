//! Clearance check capabilities
//!
//! Departments that can verify a student automatically (finance balances,
//! unreturned library books, ...) expose an [`EligibilityCheck`]. The
//! [`CheckRegistry`] maps a department code to its check implementation;
//! a department without a registered check requires manual verification.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut registry = CheckRegistry::new();
//! registry.register("FINANCE", Arc::new(FinanceFeeCheck::new(pool.clone())));
//! registry.register("LIBRARY", Arc::new(LibraryLoanCheck::new(pool)));
//!
//! if let Some(check) = registry.get("LIBRARY") {
//!     let outcome = check.check(student_id).await?;
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::StudentId;

/// Result of running a clearance check against a student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Whether the student is clear with this department
    pub is_cleared: bool,
    /// Outstanding amount owed, if any
    pub outstanding_amount: Decimal,
    /// Human-readable description of the finding
    pub description: Option<String>,
}

impl CheckOutcome {
    /// A clear outcome with nothing outstanding
    pub fn cleared() -> Self {
        Self {
            is_cleared: true,
            outstanding_amount: Decimal::ZERO,
            description: None,
        }
    }

    /// A blocked outcome with an outstanding amount
    pub fn outstanding(amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            is_cleared: false,
            outstanding_amount: amount,
            description: Some(description.into()),
        }
    }

    /// Returns true if the check found issues
    pub fn has_issues(&self) -> bool {
        !self.is_cleared
    }
}

/// Errors raised by check implementations
///
/// A check error is never fatal to clearance processing: the engine records
/// it on the clearance item and continues.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Check '{check}' failed: {message}")]
    Failed { check: String, message: String },

    #[error("Check '{check}' is unavailable: {message}")]
    Unavailable { check: String, message: String },
}

impl CheckError {
    pub fn failed(check: impl Into<String>, message: impl Into<String>) -> Self {
        CheckError::Failed {
            check: check.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(check: impl Into<String>, message: impl Into<String>) -> Self {
        CheckError::Unavailable {
            check: check.into(),
            message: message.into(),
        }
    }
}

/// A capability that can verify a student's standing with a department
#[async_trait]
pub trait EligibilityCheck: Send + Sync {
    /// Short name identifying this check in logs and error messages
    fn name(&self) -> &str;

    /// Runs the check for the given student
    async fn check(&self, student_id: StudentId) -> Result<CheckOutcome, CheckError>;
}

/// Registry of check capabilities keyed by department code
///
/// Built once at startup and shared across engines. Lookups return the
/// registered check or `None`, which callers treat as "manual verification
/// required".
#[derive(Default)]
pub struct CheckRegistry {
    checks: HashMap<String, Arc<dyn EligibilityCheck>>,
}

impl CheckRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a check for a department code, replacing any previous registration
    pub fn register(&mut self, department_code: impl Into<String>, check: Arc<dyn EligibilityCheck>) {
        self.checks.insert(department_code.into(), check);
    }

    /// Returns the check registered for a department code
    pub fn get(&self, department_code: &str) -> Option<Arc<dyn EligibilityCheck>> {
        self.checks.get(department_code).cloned()
    }

    /// Returns true if a check is registered for the department code
    pub fn is_registered(&self, department_code: &str) -> bool {
        self.checks.contains_key(department_code)
    }

    /// Returns all registered department codes
    pub fn codes(&self) -> Vec<&str> {
        self.checks.keys().map(String::as_str).collect()
    }

    /// Number of registered checks
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns true if no checks are registered
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("codes", &self.codes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct AlwaysCleared;

    #[async_trait]
    impl EligibilityCheck for AlwaysCleared {
        fn name(&self) -> &str {
            "always-cleared"
        }

        async fn check(&self, _student_id: StudentId) -> Result<CheckOutcome, CheckError> {
            Ok(CheckOutcome::cleared())
        }
    }

    struct AlwaysOwing;

    #[async_trait]
    impl EligibilityCheck for AlwaysOwing {
        fn name(&self) -> &str {
            "always-owing"
        }

        async fn check(&self, _student_id: StudentId) -> Result<CheckOutcome, CheckError> {
            Ok(CheckOutcome::outstanding(dec!(1500.00), "Outstanding fee balance"))
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = CheckRegistry::new();
        registry.register("FINANCE", Arc::new(AlwaysOwing));

        assert!(registry.is_registered("FINANCE"));
        assert!(!registry.is_registered("LIBRARY"));
        assert!(registry.get("LIBRARY").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_replaces_existing() {
        let mut registry = CheckRegistry::new();
        registry.register("FINANCE", Arc::new(AlwaysOwing));
        registry.register("FINANCE", Arc::new(AlwaysCleared));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_check_outcomes() {
        let cleared = AlwaysCleared.check(StudentId::new()).await.unwrap();
        assert!(cleared.is_cleared);
        assert!(!cleared.has_issues());
        assert_eq!(cleared.outstanding_amount, Decimal::ZERO);

        let owing = AlwaysOwing.check(StudentId::new()).await.unwrap();
        assert!(owing.has_issues());
        assert_eq!(owing.outstanding_amount, dec!(1500.00));
    }
}
