//! Academic structure - years, classes, streams, placements

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AcademicYearId, ClassId, StaffId, StreamId};

/// An academic year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    /// Short unique code, e.g. "2026"
    pub year_code: String,
    /// Display name, e.g. "Academic Year 2026"
    pub year_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Whether this is the school's current year
    pub is_current: bool,
}

impl AcademicYear {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// A class (grade level), e.g. "Grade 9"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolClass {
    pub id: ClassId,
    /// Class name, e.g. "Grade 7"
    pub name: String,
    /// Ordering within the school, lowest grade first
    pub level: i16,
    pub is_active: bool,
}

/// A stream within a class, e.g. "Blue"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassStream {
    pub id: StreamId,
    pub class_id: ClassId,
    /// Stream name, e.g. "North"
    pub name: String,
    pub is_active: bool,
}

/// Class/stream assignment for an academic year
///
/// Records which teacher and classroom a (class, stream) pair has for a
/// given year. Upserted when an entire-class promotion carries an
/// assignment for the destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassPlacement {
    pub class_id: ClassId,
    pub stream_id: StreamId,
    pub academic_year_id: AcademicYearId,
    pub class_teacher_id: Option<StaffId>,
    pub classroom: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ClassPlacement {
    pub fn new(
        class_id: ClassId,
        stream_id: StreamId,
        academic_year_id: AcademicYearId,
        class_teacher_id: Option<StaffId>,
        classroom: Option<String>,
    ) -> Self {
        Self {
            class_id,
            stream_id,
            academic_year_id,
            class_teacher_id,
            classroom,
            updated_at: Utc::now(),
        }
    }
}
