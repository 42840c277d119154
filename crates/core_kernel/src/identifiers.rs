//! Strongly-typed identifiers
//!
//! Every entity gets its own UUID newtype so a `StudentId` can never be
//! passed where a `TransferId` is expected. Ids render with a short prefix
//! ("STU-...", "TRF-...") and parse back with or without it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Time-ordered identifier, for rows read back in insertion order
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Uuid::parse_str(raw).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// People
define_id!(StudentId, "STU");
define_id!(StaffId, "STF");
define_id!(GuardianId, "GRD");

// Transfer domain identifiers
define_id!(TransferId, "TRF");
define_id!(ClearanceRecordId, "CLR");
define_id!(DepartmentId, "DPT");

// Re-admission domain identifiers
define_id!(ReAdmissionId, "RADM");

// Promotion domain identifiers
define_id!(EnrollmentId, "ENR");
define_id!(PromotionBatchId, "BAT");
define_id!(PromotionRecordId, "PRM");
define_id!(AlumniId, "ALM");

// Academic structure identifiers
define_id!(AcademicYearId, "AYR");
define_id!(ClassId, "CLS");
define_id!(StreamId, "STR");
