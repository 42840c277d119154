//! Port infrastructure shared by the domain crates
//!
//! Every workflow engine talks to storage through a port trait defined in
//! its own crate (`TransferStore`, `ReAdmissionStore`, `PromotionStore`).
//! Those traits all extend the [`DomainPort`] marker and report failures as
//! [`PortError`], so an engine behaves identically over the PostgreSQL
//! adapters and over the in-memory mocks used in tests.

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure vocabulary shared by every store port
///
/// Adapters translate their backend-specific errors into these variants;
/// engines match on them to decide between validation, conflict, and
/// not-found responses.
#[derive(Debug, Error)]
pub enum PortError {
    /// No entity of the given type under the given id
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The input violates a domain rule
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The write collides with existing data, typically a uniqueness rule
    /// such as one open transfer per student
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The backing store could not be reached
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation did not finish in time
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// Anything the caller cannot act on
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Validation error attributed to a single field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Whether a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::Timeout { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker for the store port traits; guarantees thread-safe trait objects
pub trait DomainPort: Send + Sync + 'static {}

/// Health state reported by an adapter probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    /// Reachable but slow or partially failing
    Degraded,
    Unhealthy,
}

/// Outcome of one adapter health probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Stable identifier, e.g. "postgres-transfer-store"
    pub adapter_id: String,
    pub status: AdapterHealth,
    /// Probe round-trip in milliseconds
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Implemented by adapters that can probe their backend
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}
