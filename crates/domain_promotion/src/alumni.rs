//! Alumni register

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AcademicYearId, AlumniId, ClassId, StreamId, StudentId};
use domain_student::Enrollment;

/// Per-student extras supplied with a graduation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraduationDetails {
    pub awards: Option<String>,
    pub honors: Option<String>,
    pub next_destination: Option<String>,
}

/// A graduated student's entry in the alumni register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alumni {
    pub id: AlumniId,
    pub student_id: StudentId,
    pub graduation_date: NaiveDate,
    pub final_class_id: ClassId,
    pub final_stream_id: StreamId,
    pub academic_year_id: AcademicYearId,
    /// Carried from the final enrollment when recorded
    pub final_average: Option<Decimal>,
    pub awards: Option<String>,
    pub honors: Option<String>,
    pub next_destination: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Alumni {
    /// Builds an alumni row from a student's final enrollment
    pub fn from_enrollment(
        enrollment: &Enrollment,
        graduation_date: NaiveDate,
        details: GraduationDetails,
    ) -> Self {
        Self {
            id: AlumniId::new_v7(),
            student_id: enrollment.student_id,
            graduation_date,
            final_class_id: enrollment.class_id,
            final_stream_id: enrollment.stream_id,
            academic_year_id: enrollment.academic_year_id,
            final_average: enrollment.final_average,
            awards: details.awards,
            honors: details.honors,
            next_destination: details.next_destination,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_alumni_carries_the_final_average() {
        let mut enrollment = Enrollment::new(
            StudentId::new(),
            AcademicYearId::new(),
            ClassId::new(),
            StreamId::new(),
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        );
        enrollment.final_average = Some(dec!(71.40));

        let alumni = Alumni::from_enrollment(
            &enrollment,
            NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            GraduationDetails {
                awards: Some("Best in Mathematics".to_string()),
                honors: None,
                next_destination: Some("Alliance High School".to_string()),
            },
        );

        assert_eq!(alumni.student_id, enrollment.student_id);
        assert_eq!(alumni.final_average, Some(dec!(71.40)));
        assert_eq!(alumni.final_class_id, enrollment.class_id);
        assert_eq!(alumni.awards.as_deref(), Some("Best in Mathematics"));
    }
}
