//! Test Fixtures
//!
//! Pre-built entities shared across the test suite.

use chrono::NaiveDate;
use core_kernel::{AcademicYearId, DepartmentId};
use domain_student::AcademicYear;
use domain_transfer::ClearanceDepartment;

/// A clearance department with the given code and processing position
pub fn department(code: &str, name: &str, sort_order: i16, is_mandatory: bool) -> ClearanceDepartment {
    ClearanceDepartment {
        id: DepartmentId::new(),
        code: code.to_string(),
        name: name.to_string(),
        description: None,
        is_mandatory,
        sort_order,
        is_active: true,
    }
}

/// The department set the initial schema seeds
pub fn standard_departments() -> Vec<ClearanceDepartment> {
    vec![
        department("FINANCE", "Finance Office", 1, true),
        department("LIBRARY", "Library", 2, true),
        department("SPORTS", "Sports Department", 3, true),
    ]
}

/// An academic year running January through November of the given year
pub fn academic_year(year: i32, is_current: bool) -> AcademicYear {
    AcademicYear {
        id: AcademicYearId::new(),
        year_code: year.to_string(),
        year_name: format!("Academic Year {}", year),
        start_date: NaiveDate::from_ymd_opt(year, 1, 6).unwrap(),
        end_date: NaiveDate::from_ymd_opt(year, 11, 20).unwrap(),
        is_current,
    }
}
