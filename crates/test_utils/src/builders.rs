//! Test Data Builders
//!
//! Builders for the entities tests construct most often, with sensible
//! defaults so tests only spell out the fields they care about.

use chrono::NaiveDate;
use core_kernel::{AcademicYearId, ClassId, StreamId, StudentId};
use rust_decimal::Decimal;

use domain_student::{Enrollment, Student, StudentStatus};

/// Builder for test students
pub struct StudentBuilder {
    admission_no: String,
    first_name: String,
    last_name: String,
    status: StudentStatus,
    class_id: Option<ClassId>,
    stream_id: Option<StreamId>,
}

impl Default for StudentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StudentBuilder {
    pub fn new() -> Self {
        Self {
            admission_no: "ADM-0001".to_string(),
            first_name: "Amina".to_string(),
            last_name: "Wanjiru".to_string(),
            status: StudentStatus::Active,
            class_id: None,
            stream_id: None,
        }
    }

    pub fn with_admission_no(mut self, admission_no: impl Into<String>) -> Self {
        self.admission_no = admission_no.into();
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    pub fn with_status(mut self, status: StudentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn in_class(mut self, class_id: ClassId, stream_id: StreamId) -> Self {
        self.class_id = Some(class_id);
        self.stream_id = Some(stream_id);
        self
    }

    pub fn build(self) -> Student {
        let mut student = Student::new(self.admission_no, self.first_name, self.last_name);
        student.status = self.status;
        student.class_id = self.class_id;
        student.stream_id = self.stream_id;
        student
    }
}

/// Builder for test enrollments
pub struct EnrollmentBuilder {
    student_id: StudentId,
    academic_year_id: AcademicYearId,
    class_id: ClassId,
    stream_id: StreamId,
    enrollment_date: NaiveDate,
    final_average: Option<Decimal>,
}

impl EnrollmentBuilder {
    pub fn new(student_id: StudentId, academic_year_id: AcademicYearId) -> Self {
        Self {
            student_id,
            academic_year_id,
            class_id: ClassId::new(),
            stream_id: StreamId::new(),
            enrollment_date: NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(),
            final_average: None,
        }
    }

    pub fn in_class(mut self, class_id: ClassId, stream_id: StreamId) -> Self {
        self.class_id = class_id;
        self.stream_id = stream_id;
        self
    }

    pub fn with_enrollment_date(mut self, date: NaiveDate) -> Self {
        self.enrollment_date = date;
        self
    }

    pub fn with_final_average(mut self, average: Decimal) -> Self {
        self.final_average = Some(average);
        self
    }

    pub fn build(self) -> Enrollment {
        let mut enrollment = Enrollment::new(
            self.student_id,
            self.academic_year_id,
            self.class_id,
            self.stream_id,
            self.enrollment_date,
        );
        enrollment.final_average = self.final_average;
        enrollment
    }
}
