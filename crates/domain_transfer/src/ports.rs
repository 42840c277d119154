//! Transfer Domain Ports
//!
//! The [`TransferStore`] trait is everything the transfer workflow engine
//! needs from storage. The PostgreSQL adapter in `infra_db` is the production
//! implementation; the mock below backs the unit and scenario tests.
//!
//! Methods that touch more than one table are the transactional units: the
//! adapter wraps each in a single database transaction so callers never
//! compose transactions themselves.

use async_trait::async_trait;

use core_kernel::{DepartmentId, DomainPort, PortError, StudentId, TransferId};
use domain_student::Student;

use crate::clearance::{ClearanceDepartment, ClearanceRecord};
use crate::transfer::Transfer;

/// Storage port for the transfer workflow
#[async_trait]
pub trait TransferStore: DomainPort {
    /// Retrieves a student by id
    async fn get_student(&self, id: StudentId) -> Result<Student, PortError>;

    /// Retrieves a transfer by id
    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, PortError>;

    /// Returns the student's transfer in a non-terminal status, if any
    async fn find_open_transfer(&self, student_id: StudentId) -> Result<Option<Transfer>, PortError>;

    /// Active clearance departments in processing order
    async fn active_departments(&self) -> Result<Vec<ClearanceDepartment>, PortError>;

    /// Looks up an active department by code
    async fn department_by_code(&self, code: &str) -> Result<Option<ClearanceDepartment>, PortError>;

    /// Inserts a transfer together with its initial clearance records
    ///
    /// Atomic: either the transfer and every record land, or nothing does.
    /// Fails with `Conflict` if the student already has an open transfer.
    async fn insert_transfer(
        &self,
        transfer: &Transfer,
        clearances: &[ClearanceRecord],
    ) -> Result<(), PortError>;

    /// Persists transfer field and status changes
    async fn update_transfer(&self, transfer: &Transfer) -> Result<(), PortError>;

    /// All clearance records for a transfer, in department order
    async fn clearances_for(&self, transfer_id: TransferId) -> Result<Vec<ClearanceRecord>, PortError>;

    /// The clearance record for one department of a transfer, if created
    async fn clearance_for_department(
        &self,
        transfer_id: TransferId,
        department_id: DepartmentId,
    ) -> Result<Option<ClearanceRecord>, PortError>;

    /// Upserts a clearance record and, when given, the transfer in one unit
    ///
    /// The transfer is passed when processing the record changed the
    /// aggregate state (all cleared, or a new block).
    async fn save_clearance(
        &self,
        record: &ClearanceRecord,
        transfer: Option<&Transfer>,
    ) -> Result<(), PortError>;

    /// Persists a completed transfer and the updated student in one unit
    async fn complete_transfer(&self, transfer: &Transfer, student: &Student) -> Result<(), PortError>;
}

/// In-memory store for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock implementation of [`TransferStore`]
    ///
    /// Enforces the same uniqueness rules as the database schema: one open
    /// transfer per student, one clearance record per (transfer, department).
    #[derive(Debug, Default)]
    pub struct MockTransferStore {
        students: Arc<RwLock<HashMap<StudentId, Student>>>,
        departments: Arc<RwLock<Vec<ClearanceDepartment>>>,
        transfers: Arc<RwLock<HashMap<TransferId, Transfer>>>,
        clearances: Arc<RwLock<HashMap<(TransferId, DepartmentId), ClearanceRecord>>>,
    }

    impl MockTransferStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn insert_student(&self, student: Student) {
            self.students.write().await.insert(student.id, student);
        }

        pub async fn insert_department(&self, department: ClearanceDepartment) {
            self.departments.write().await.push(department);
        }

        /// Pre-populates students and departments for testing
        pub async fn with_data(students: Vec<Student>, departments: Vec<ClearanceDepartment>) -> Self {
            let store = Self::new();
            for student in students {
                store.insert_student(student).await;
            }
            *store.departments.write().await = departments;
            store
        }

        /// Snapshot of a stored student, for assertions
        pub async fn student_snapshot(&self, id: StudentId) -> Option<Student> {
            self.students.read().await.get(&id).cloned()
        }
    }

    impl DomainPort for MockTransferStore {}

    #[async_trait]
    impl TransferStore for MockTransferStore {
        async fn get_student(&self, id: StudentId) -> Result<Student, PortError> {
            self.students
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Student", id))
        }

        async fn get_transfer(&self, id: TransferId) -> Result<Transfer, PortError> {
            self.transfers
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Transfer", id))
        }

        async fn find_open_transfer(
            &self,
            student_id: StudentId,
        ) -> Result<Option<Transfer>, PortError> {
            Ok(self
                .transfers
                .read()
                .await
                .values()
                .find(|t| t.student_id == student_id && t.status.is_open())
                .cloned())
        }

        async fn active_departments(&self) -> Result<Vec<ClearanceDepartment>, PortError> {
            let mut departments: Vec<_> = self
                .departments
                .read()
                .await
                .iter()
                .filter(|d| d.is_active)
                .cloned()
                .collect();
            departments.sort_by_key(|d| d.sort_order);
            Ok(departments)
        }

        async fn department_by_code(
            &self,
            code: &str,
        ) -> Result<Option<ClearanceDepartment>, PortError> {
            Ok(self
                .departments
                .read()
                .await
                .iter()
                .find(|d| d.is_active && d.code == code)
                .cloned())
        }

        async fn insert_transfer(
            &self,
            transfer: &Transfer,
            clearances: &[ClearanceRecord],
        ) -> Result<(), PortError> {
            let mut transfers = self.transfers.write().await;
            let duplicate = transfers
                .values()
                .any(|t| t.student_id == transfer.student_id && t.status.is_open());
            if duplicate {
                return Err(PortError::conflict(format!(
                    "Student {} already has a transfer in a non-terminal status",
                    transfer.student_id
                )));
            }

            let mut records = self.clearances.write().await;
            for record in clearances {
                let key = (record.transfer_id, record.department_id);
                if records.contains_key(&key) {
                    return Err(PortError::conflict(
                        "Clearance record already exists for this department",
                    ));
                }
                records.insert(key, record.clone());
            }
            transfers.insert(transfer.id, transfer.clone());
            Ok(())
        }

        async fn update_transfer(&self, transfer: &Transfer) -> Result<(), PortError> {
            let mut transfers = self.transfers.write().await;
            if !transfers.contains_key(&transfer.id) {
                return Err(PortError::not_found("Transfer", transfer.id));
            }
            transfers.insert(transfer.id, transfer.clone());
            Ok(())
        }

        async fn clearances_for(
            &self,
            transfer_id: TransferId,
        ) -> Result<Vec<ClearanceRecord>, PortError> {
            let mut records: Vec<_> = self
                .clearances
                .read()
                .await
                .values()
                .filter(|r| r.transfer_id == transfer_id)
                .cloned()
                .collect();
            records.sort_by(|a, b| a.department_code.cmp(&b.department_code));
            Ok(records)
        }

        async fn clearance_for_department(
            &self,
            transfer_id: TransferId,
            department_id: DepartmentId,
        ) -> Result<Option<ClearanceRecord>, PortError> {
            Ok(self
                .clearances
                .read()
                .await
                .get(&(transfer_id, department_id))
                .cloned())
        }

        async fn save_clearance(
            &self,
            record: &ClearanceRecord,
            transfer: Option<&Transfer>,
        ) -> Result<(), PortError> {
            self.clearances
                .write()
                .await
                .insert((record.transfer_id, record.department_id), record.clone());
            if let Some(transfer) = transfer {
                self.transfers
                    .write()
                    .await
                    .insert(transfer.id, transfer.clone());
            }
            Ok(())
        }

        async fn complete_transfer(
            &self,
            transfer: &Transfer,
            student: &Student,
        ) -> Result<(), PortError> {
            self.transfers
                .write()
                .await
                .insert(transfer.id, transfer.clone());
            self.students
                .write()
                .await
                .insert(student.id, student.clone());
            Ok(())
        }
    }
}
