//! Promotion and graduation DTOs

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{AcademicYearId, ClassId, StaffId, StreamId, StudentId};
use domain_promotion::{
    ClassAssignment, ClassPromotionMapping, GraduationDetails, PromotionTarget,
};
use domain_student::Enrollment;

#[derive(Debug, Deserialize)]
pub struct PromoteStudentRequest {
    pub student_id: Uuid,
    pub to_class_id: Uuid,
    pub to_stream_id: Uuid,
    pub from_year_id: Uuid,
    pub to_year_id: Uuid,
    pub remarks: Option<String>,
    pub actor: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PromoteStudentsRequest {
    pub student_ids: Vec<Uuid>,
    pub to_class_id: Uuid,
    pub to_stream_id: Uuid,
    pub from_year_id: Uuid,
    pub to_year_id: Uuid,
    pub remarks: Option<String>,
    pub actor: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PromoteClassRequest {
    pub from_class_id: Uuid,
    pub from_stream_id: Uuid,
    pub to_class_id: Uuid,
    pub to_stream_id: Uuid,
    pub from_year_id: Uuid,
    pub to_year_id: Uuid,
    pub class_teacher_id: Option<Uuid>,
    pub classroom: Option<String>,
    pub actor: Uuid,
}

impl PromoteClassRequest {
    pub fn assignment(&self) -> Option<ClassAssignment> {
        if self.class_teacher_id.is_none() && self.classroom.is_none() {
            return None;
        }
        Some(ClassAssignment {
            class_teacher_id: self.class_teacher_id.map(StaffId::from),
            classroom: self.classroom.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ClassMappingDto {
    pub from_class_id: Uuid,
    pub from_stream_id: Uuid,
    pub to_class_id: Uuid,
    pub to_stream_id: Uuid,
    pub class_teacher_id: Option<Uuid>,
    pub classroom: Option<String>,
}

impl ClassMappingDto {
    pub fn into_domain(self) -> ClassPromotionMapping {
        let assignment = if self.class_teacher_id.is_none() && self.classroom.is_none() {
            None
        } else {
            Some(ClassAssignment {
                class_teacher_id: self.class_teacher_id.map(StaffId::from),
                classroom: self.classroom,
            })
        };
        ClassPromotionMapping {
            from_class_id: ClassId::from(self.from_class_id),
            from_stream_id: StreamId::from(self.from_stream_id),
            target: PromotionTarget {
                class_id: ClassId::from(self.to_class_id),
                stream_id: StreamId::from(self.to_stream_id),
            },
            assignment,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PromoteSchoolRequest {
    pub mappings: Vec<ClassMappingDto>,
    pub from_year_id: Uuid,
    pub to_year_id: Uuid,
    pub actor: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GraduationDetailDto {
    pub student_id: Uuid,
    pub awards: Option<String>,
    pub honors: Option<String>,
    pub next_destination: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GraduateClassRequest {
    pub class_id: Uuid,
    pub stream_id: Uuid,
    pub year_id: Uuid,
    pub graduation_date: NaiveDate,
    #[serde(default)]
    pub details: Vec<GraduationDetailDto>,
    pub actor: Uuid,
}

impl GraduateClassRequest {
    pub fn details_map(&self) -> HashMap<StudentId, GraduationDetails> {
        self.details
            .iter()
            .map(|d| {
                (
                    StudentId::from(d.student_id),
                    GraduationDetails {
                        awards: d.awards.clone(),
                        honors: d.honors.clone(),
                        next_destination: d.next_destination.clone(),
                    },
                )
            })
            .collect()
    }
}

pub fn target(to_class_id: Uuid, to_stream_id: Uuid) -> PromotionTarget {
    PromotionTarget {
        class_id: ClassId::from(to_class_id),
        stream_id: StreamId::from(to_stream_id),
    }
}

pub fn year(id: Uuid) -> AcademicYearId {
    AcademicYearId::from(id)
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub academic_year_id: Uuid,
    pub class_id: Uuid,
    pub stream_id: Uuid,
    pub enrollment_status: String,
    pub promotion_status: String,
    pub enrollment_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id.into(),
            student_id: enrollment.student_id.into(),
            academic_year_id: enrollment.academic_year_id.into(),
            class_id: enrollment.class_id.into(),
            stream_id: enrollment.stream_id.into(),
            enrollment_status: enrollment.enrollment_status.to_string(),
            promotion_status: enrollment.promotion_status.to_string(),
            enrollment_date: enrollment.enrollment_date,
            created_at: enrollment.created_at,
        }
    }
}
