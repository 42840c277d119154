//! Re-Admission Domain Ports

use async_trait::async_trait;
use rust_decimal::Decimal;

use core_kernel::{DomainPort, PortError, ReAdmissionId, StudentId};
use domain_student::Student;

use crate::readmission::ReAdmission;

/// Storage port for the re-admission workflow
#[async_trait]
pub trait ReAdmissionStore: DomainPort {
    /// Retrieves a student by id
    async fn get_student(&self, id: StudentId) -> Result<Student, PortError>;

    /// Retrieves a re-admission by id
    async fn get_readmission(&self, id: ReAdmissionId) -> Result<ReAdmission, PortError>;

    /// Returns the student's re-admission in a non-terminal status, if any
    async fn find_open_readmission(
        &self,
        student_id: StudentId,
    ) -> Result<Option<ReAdmission>, PortError>;

    /// Outstanding fee balance carried from the student's prior enrollment
    async fn outstanding_balance(&self, student_id: StudentId) -> Result<Decimal, PortError>;

    /// Inserts a new re-admission
    ///
    /// Fails with `Conflict` if the student already has an open re-admission.
    async fn insert_readmission(&self, readmission: &ReAdmission) -> Result<(), PortError>;

    /// Persists re-admission field and status changes
    async fn update_readmission(&self, readmission: &ReAdmission) -> Result<(), PortError>;

    /// Persists a completed re-admission and the reactivated student in one unit
    async fn complete_readmission(
        &self,
        readmission: &ReAdmission,
        student: &Student,
    ) -> Result<(), PortError>;
}

/// In-memory store for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock implementation of [`ReAdmissionStore`]
    ///
    /// Enforces the one-open-re-admission-per-student rule the database
    /// schema enforces with a partial unique index.
    #[derive(Debug, Default)]
    pub struct MockReAdmissionStore {
        students: Arc<RwLock<HashMap<StudentId, Student>>>,
        readmissions: Arc<RwLock<HashMap<ReAdmissionId, ReAdmission>>>,
        balances: Arc<RwLock<HashMap<StudentId, Decimal>>>,
    }

    impl MockReAdmissionStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn insert_student(&self, student: Student) {
            self.students.write().await.insert(student.id, student);
        }

        pub async fn set_balance(&self, student_id: StudentId, balance: Decimal) {
            self.balances.write().await.insert(student_id, balance);
        }

        /// Snapshot of a stored student, for assertions
        pub async fn student_snapshot(&self, id: StudentId) -> Option<Student> {
            self.students.read().await.get(&id).cloned()
        }
    }

    impl DomainPort for MockReAdmissionStore {}

    #[async_trait]
    impl ReAdmissionStore for MockReAdmissionStore {
        async fn get_student(&self, id: StudentId) -> Result<Student, PortError> {
            self.students
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Student", id))
        }

        async fn get_readmission(&self, id: ReAdmissionId) -> Result<ReAdmission, PortError> {
            self.readmissions
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("ReAdmission", id))
        }

        async fn find_open_readmission(
            &self,
            student_id: StudentId,
        ) -> Result<Option<ReAdmission>, PortError> {
            Ok(self
                .readmissions
                .read()
                .await
                .values()
                .find(|r| r.student_id == student_id && r.status.is_open())
                .cloned())
        }

        async fn outstanding_balance(&self, student_id: StudentId) -> Result<Decimal, PortError> {
            Ok(self
                .balances
                .read()
                .await
                .get(&student_id)
                .copied()
                .unwrap_or(Decimal::ZERO))
        }

        async fn insert_readmission(&self, readmission: &ReAdmission) -> Result<(), PortError> {
            let mut readmissions = self.readmissions.write().await;
            let duplicate = readmissions
                .values()
                .any(|r| r.student_id == readmission.student_id && r.status.is_open());
            if duplicate {
                return Err(PortError::conflict(format!(
                    "Student {} already has a re-admission in a non-terminal status",
                    readmission.student_id
                )));
            }
            readmissions.insert(readmission.id, readmission.clone());
            Ok(())
        }

        async fn update_readmission(&self, readmission: &ReAdmission) -> Result<(), PortError> {
            let mut readmissions = self.readmissions.write().await;
            if !readmissions.contains_key(&readmission.id) {
                return Err(PortError::not_found("ReAdmission", readmission.id));
            }
            readmissions.insert(readmission.id, readmission.clone());
            Ok(())
        }

        async fn complete_readmission(
            &self,
            readmission: &ReAdmission,
            student: &Student,
        ) -> Result<(), PortError> {
            self.readmissions
                .write()
                .await
                .insert(readmission.id, readmission.clone());
            self.students
                .write()
                .await
                .insert(student.id, student.clone());
            Ok(())
        }
    }
}
