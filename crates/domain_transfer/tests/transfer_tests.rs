//! Transfer workflow scenarios against the in-memory store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::numbering::mock::CountingNumberGenerator;
use core_kernel::{
    CheckError, CheckOutcome, CheckRegistry, ClassId, EligibilityCheck, StaffId, StreamId,
    StudentId,
};
use domain_student::{Student, StudentStatus};
use domain_transfer::ports::mock::MockTransferStore;
use domain_transfer::{
    ApprovalDecision, ApprovalOutcome, ClearanceDepartment, ClearanceInput, ClearanceStatus,
    TransferDocuments, TransferError, TransferRequest, TransferStatus, TransferType,
    TransferWorkflowEngine,
};

struct ClearedCheck;

#[async_trait]
impl EligibilityCheck for ClearedCheck {
    fn name(&self) -> &str {
        "cleared"
    }

    async fn check(&self, _student_id: StudentId) -> Result<CheckOutcome, CheckError> {
        Ok(CheckOutcome::cleared())
    }
}

struct OwingCheck {
    amount: Decimal,
    description: &'static str,
}

#[async_trait]
impl EligibilityCheck for OwingCheck {
    fn name(&self) -> &str {
        "owing"
    }

    async fn check(&self, _student_id: StudentId) -> Result<CheckOutcome, CheckError> {
        Ok(CheckOutcome::outstanding(self.amount, self.description))
    }
}

struct BrokenCheck;

#[async_trait]
impl EligibilityCheck for BrokenCheck {
    fn name(&self) -> &str {
        "broken"
    }

    async fn check(&self, _student_id: StudentId) -> Result<CheckOutcome, CheckError> {
        Err(CheckError::unavailable("broken", "connection refused"))
    }
}

fn department(code: &str, sort_order: i16) -> ClearanceDepartment {
    ClearanceDepartment {
        id: core_kernel::DepartmentId::new(),
        code: code.to_string(),
        name: format!("{} Office", code),
        description: None,
        is_mandatory: true,
        sort_order,
        is_active: true,
    }
}

fn standard_departments() -> Vec<ClearanceDepartment> {
    vec![
        department("FINANCE", 1),
        department("LIBRARY", 2),
        department("SPORTS", 3),
    ]
}

fn external_request(student: &Student) -> TransferRequest {
    TransferRequest {
        student_id: student.id,
        transfer_type: TransferType::External,
        reason: "Family relocating to Mombasa".to_string(),
        request_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        destination_school: Some("Coast Academy".to_string()),
        destination_school_code: Some("CA-001".to_string()),
        destination_class_id: None,
        destination_stream_id: None,
    }
}

struct Harness {
    engine: TransferWorkflowEngine,
    store: Arc<MockTransferStore>,
    actor: StaffId,
}

async fn harness_with(
    students: Vec<Student>,
    registry: CheckRegistry,
    fee_check: Arc<dyn EligibilityCheck>,
) -> Harness {
    let store = Arc::new(MockTransferStore::with_data(students, standard_departments()).await);
    let engine = TransferWorkflowEngine::new(
        store.clone(),
        Arc::new(registry),
        Arc::new(CountingNumberGenerator::new()),
        fee_check,
    );
    Harness {
        engine,
        store,
        actor: StaffId::new(),
    }
}

/// Clears every department via explicit manual decisions, leaving the
/// transfer on `fees_pending`
async fn clear_all_departments(harness: &Harness, transfer_id: core_kernel::TransferId) {
    for code in ["FINANCE", "LIBRARY", "SPORTS"] {
        harness
            .engine
            .process_department_clearance(
                transfer_id,
                code,
                ClearanceInput {
                    status: Some(ClearanceStatus::Cleared),
                    ..Default::default()
                },
                harness.actor,
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_external_transfer_full_lifecycle() {
    let student = Student::new("ADM-1001", "Amina", "Wanjiru");
    let student_id = student.id;
    let request = external_request(&student);
    let harness = harness_with(vec![student], CheckRegistry::new(), Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::PendingClearance);
    assert!(transfer.transfer_no.starts_with("TRF-"));

    // One pending record per mandatory department
    let report = harness.engine.clearance_status(transfer.id).await.unwrap();
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.pending, 3);

    clear_all_departments(&harness, transfer.id).await;
    let details = harness.engine.transfer_details(transfer.id).await.unwrap();
    assert!(details.summary.all_cleared);
    assert_eq!(details.transfer.status, TransferStatus::FeesPending);

    let settlement = harness
        .engine
        .verify_fee_settlement(transfer.id, harness.actor)
        .await
        .unwrap();
    assert!(settlement.settled);
    assert_eq!(settlement.transfer_status, TransferStatus::PendingApproval);

    let approved = harness
        .engine
        .approve_transfer(
            transfer.id,
            ApprovalDecision {
                outcome: ApprovalOutcome::Approved,
                notes: Some("All clear".to_string()),
                rejection_reason: None,
            },
            harness.actor,
        )
        .await
        .unwrap();
    assert_eq!(approved.status, TransferStatus::DocumentsReady);
    assert_eq!(approved.approved_by, Some(harness.actor));

    let documented = harness
        .engine
        .mark_documents_ready(transfer.id, TransferDocuments::default(), harness.actor)
        .await
        .unwrap();
    let certificate_no = documented.leaving_certificate_no.clone().unwrap();
    assert!(certificate_no.starts_with("LC-2026-"));

    let completed = harness
        .engine
        .complete_transfer(
            transfer.id,
            Some(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()),
            harness.actor,
        )
        .await
        .unwrap();
    assert_eq!(completed.status, TransferStatus::Completed);
    assert_eq!(
        completed.effective_date,
        Some(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap())
    );

    let student = harness.store.student_snapshot(student_id).await.unwrap();
    assert_eq!(student.status, StudentStatus::Transferred);
}

#[tokio::test]
async fn test_second_transfer_while_one_is_open_is_rejected() {
    let student = Student::new("ADM-1002", "Brian", "Otieno");
    let request = external_request(&student);
    let harness = harness_with(vec![student], CheckRegistry::new(), Arc::new(ClearedCheck)).await;

    harness
        .engine
        .initiate_transfer(request.clone(), harness.actor)
        .await
        .unwrap();
    let result = harness.engine.initiate_transfer(request, harness.actor).await;
    assert!(matches!(result, Err(TransferError::TransferInProgress(_))));
}

#[tokio::test]
async fn test_registered_check_with_balance_blocks_and_waiver_unblocks() {
    let student = Student::new("ADM-1003", "Carol", "Mwangi");
    let request = external_request(&student);
    let mut registry = CheckRegistry::new();
    registry.register(
        "FINANCE",
        Arc::new(OwingCheck {
            amount: dec!(4250.00),
            description: "Unpaid term 1 fees",
        }),
    );
    let harness = harness_with(vec![student], registry, Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();

    // The finance check finds a balance: the record blocks and the
    // transfer flags the block
    let decision = harness
        .engine
        .process_department_clearance(
            transfer.id,
            "FINANCE",
            ClearanceInput::default(),
            harness.actor,
        )
        .await
        .unwrap();
    assert_eq!(decision.record.status, ClearanceStatus::Blocked);
    assert_eq!(decision.record.outstanding_amount, dec!(4250.00));
    assert_eq!(decision.transfer_status, TransferStatus::ClearanceInProgress);

    // A waiver clears the record while preserving the finding
    let waived = harness
        .engine
        .grant_waiver(
            transfer.id,
            "FINANCE",
            "Bursary approved by the principal".to_string(),
            harness.actor,
        )
        .await
        .unwrap();
    assert_eq!(waived.record.status, ClearanceStatus::Cleared);
    assert!(waived.record.waiver_granted);
    assert!(waived.record.has_issues);
    // No blocks remain, so the transfer returns to pending clearance
    assert_eq!(waived.transfer_status, TransferStatus::PendingClearance);

    for code in ["LIBRARY", "SPORTS"] {
        harness
            .engine
            .process_department_clearance(
                transfer.id,
                code,
                ClearanceInput {
                    status: Some(ClearanceStatus::Cleared),
                    ..Default::default()
                },
                harness.actor,
            )
            .await
            .unwrap();
    }
    let details = harness.engine.transfer_details(transfer.id).await.unwrap();
    assert_eq!(details.transfer.status, TransferStatus::FeesPending);
}

#[tokio::test]
async fn test_check_error_is_recorded_and_record_stays_pending() {
    let student = Student::new("ADM-1004", "David", "Kiprop");
    let request = external_request(&student);
    let mut registry = CheckRegistry::new();
    registry.register("LIBRARY", Arc::new(BrokenCheck));
    let harness = harness_with(vec![student], registry, Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();

    let decision = harness
        .engine
        .process_department_clearance(
            transfer.id,
            "LIBRARY",
            ClearanceInput::default(),
            harness.actor,
        )
        .await
        .unwrap();
    assert_eq!(decision.record.status, ClearanceStatus::Pending);
    assert!(decision.record.has_issues);
    assert!(decision
        .record
        .issue_description
        .as_deref()
        .unwrap()
        .contains("connection refused"));
    assert_eq!(decision.transfer_status, TransferStatus::PendingClearance);
}

#[tokio::test]
async fn test_manual_department_without_decision_stays_pending() {
    let student = Student::new("ADM-1005", "Esther", "Njoki");
    let request = external_request(&student);
    let harness = harness_with(vec![student], CheckRegistry::new(), Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();

    let decision = harness
        .engine
        .process_department_clearance(
            transfer.id,
            "SPORTS",
            ClearanceInput::default(),
            harness.actor,
        )
        .await
        .unwrap();
    assert_eq!(decision.record.status, ClearanceStatus::Pending);
    assert_eq!(
        decision.record.issue_description.as_deref(),
        Some("Manual verification required")
    );
}

#[tokio::test]
async fn test_unsettled_fees_keep_transfer_in_fees_pending() {
    let student = Student::new("ADM-1006", "Felix", "Omondi");
    let request = external_request(&student);
    let harness = harness_with(
        vec![student],
        CheckRegistry::new(),
        Arc::new(OwingCheck {
            amount: dec!(980.00),
            description: "Transport arrears",
        }),
    )
    .await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();
    clear_all_departments(&harness, transfer.id).await;

    let settlement = harness
        .engine
        .verify_fee_settlement(transfer.id, harness.actor)
        .await
        .unwrap();
    assert!(!settlement.settled);
    assert_eq!(settlement.outstanding_amount, dec!(980.00));
    assert_eq!(settlement.transfer_status, TransferStatus::FeesPending);

    // Approval is not reachable until the fees are settled
    let result = harness
        .engine
        .approve_transfer(
            transfer.id,
            ApprovalDecision {
                outcome: ApprovalOutcome::Approved,
                notes: None,
                rejection_reason: None,
            },
            harness.actor,
        )
        .await;
    assert!(matches!(result, Err(TransferError::WrongStage { .. })));
}

#[tokio::test]
async fn test_rejection_requires_a_reason_and_is_terminal() {
    let student = Student::new("ADM-1007", "Grace", "Akinyi");
    let request = external_request(&student);
    let harness = harness_with(vec![student], CheckRegistry::new(), Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();
    clear_all_departments(&harness, transfer.id).await;
    harness
        .engine
        .verify_fee_settlement(transfer.id, harness.actor)
        .await
        .unwrap();

    let missing_reason = harness
        .engine
        .approve_transfer(
            transfer.id,
            ApprovalDecision {
                outcome: ApprovalOutcome::Rejected,
                notes: None,
                rejection_reason: None,
            },
            harness.actor,
        )
        .await;
    assert!(matches!(missing_reason, Err(TransferError::Validation(_))));

    let rejected = harness
        .engine
        .approve_transfer(
            transfer.id,
            ApprovalDecision {
                outcome: ApprovalOutcome::Rejected,
                notes: None,
                rejection_reason: Some("Guardian consent missing".to_string()),
            },
            harness.actor,
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, TransferStatus::Rejected);

    let result = harness
        .engine
        .complete_transfer(transfer.id, None, harness.actor)
        .await;
    assert!(matches!(result, Err(TransferError::WrongStage { .. })));
}

#[tokio::test]
async fn test_internal_transfer_moves_the_student_between_streams() {
    let mut student = Student::new("ADM-1008", "Hassan", "Mutua");
    let class_id = ClassId::new();
    let old_stream = StreamId::new();
    let new_stream = StreamId::new();
    student.class_id = Some(class_id);
    student.stream_id = Some(old_stream);
    let student_id = student.id;

    let request = TransferRequest {
        student_id,
        transfer_type: TransferType::Internal,
        reason: "Stream rebalancing".to_string(),
        request_date: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
        destination_school: None,
        destination_school_code: None,
        destination_class_id: None,
        destination_stream_id: Some(new_stream),
    };
    let harness = harness_with(vec![student], CheckRegistry::new(), Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();
    assert_eq!(transfer.from_stream_id, Some(old_stream));

    clear_all_departments(&harness, transfer.id).await;
    harness
        .engine
        .verify_fee_settlement(transfer.id, harness.actor)
        .await
        .unwrap();
    harness
        .engine
        .approve_transfer(
            transfer.id,
            ApprovalDecision {
                outcome: ApprovalOutcome::Approved,
                notes: None,
                rejection_reason: None,
            },
            harness.actor,
        )
        .await
        .unwrap();
    harness
        .engine
        .complete_transfer(transfer.id, None, harness.actor)
        .await
        .unwrap();

    let student = harness.store.student_snapshot(student_id).await.unwrap();
    // The student stays active and lands in the new stream of the same class
    assert_eq!(student.status, StudentStatus::Active);
    assert_eq!(student.class_id, Some(class_id));
    assert_eq!(student.stream_id, Some(new_stream));
}

#[tokio::test]
async fn test_graduation_transfer_marks_student_graduated() {
    let student = Student::new("ADM-1009", "Irene", "Chebet");
    let student_id = student.id;
    let request = TransferRequest {
        student_id,
        transfer_type: TransferType::Graduation,
        reason: "Completed final grade".to_string(),
        request_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
        destination_school: None,
        destination_school_code: None,
        destination_class_id: None,
        destination_stream_id: None,
    };
    let harness = harness_with(vec![student], CheckRegistry::new(), Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();
    clear_all_departments(&harness, transfer.id).await;
    harness
        .engine
        .verify_fee_settlement(transfer.id, harness.actor)
        .await
        .unwrap();
    harness
        .engine
        .approve_transfer(
            transfer.id,
            ApprovalDecision {
                outcome: ApprovalOutcome::Approved,
                notes: None,
                rejection_reason: None,
            },
            harness.actor,
        )
        .await
        .unwrap();
    harness
        .engine
        .complete_transfer(transfer.id, None, harness.actor)
        .await
        .unwrap();

    let student = harness.store.student_snapshot(student_id).await.unwrap();
    assert_eq!(student.status, StudentStatus::Graduated);
}

#[tokio::test]
async fn test_cancel_reopens_the_student_for_new_transfers() {
    let student = Student::new("ADM-1010", "James", "Baraka");
    let request = external_request(&student);
    let harness = harness_with(vec![student], CheckRegistry::new(), Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request.clone(), harness.actor)
        .await
        .unwrap();
    let cancelled = harness
        .engine
        .cancel_transfer(transfer.id, "Parent withdrew the request".to_string(), harness.actor)
        .await
        .unwrap();
    assert_eq!(cancelled.status, TransferStatus::Cancelled);

    // With no open transfer a new one can start
    harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_clearance_rejected_after_fees_stage() {
    let student = Student::new("ADM-1011", "Kevin", "Njoroge");
    let request = external_request(&student);
    let harness = harness_with(vec![student], CheckRegistry::new(), Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();
    clear_all_departments(&harness, transfer.id).await;

    let result = harness
        .engine
        .process_department_clearance(
            transfer.id,
            "FINANCE",
            ClearanceInput {
                status: Some(ClearanceStatus::Cleared),
                ..Default::default()
            },
            harness.actor,
        )
        .await;
    assert!(matches!(result, Err(TransferError::WrongStage { .. })));
}

#[tokio::test]
async fn test_unknown_department_code() {
    let student = Student::new("ADM-1012", "Lydia", "Wambui");
    let request = external_request(&student);
    let harness = harness_with(vec![student], CheckRegistry::new(), Arc::new(ClearedCheck)).await;

    let transfer = harness
        .engine
        .initiate_transfer(request, harness.actor)
        .await
        .unwrap();
    let result = harness
        .engine
        .process_department_clearance(
            transfer.id,
            "CHAPLAINCY",
            ClearanceInput::default(),
            harness.actor,
        )
        .await;
    assert!(matches!(result, Err(TransferError::DepartmentNotFound(_))));
}

#[tokio::test]
async fn test_screening_reports_every_active_department() {
    let student = Student::new("ADM-1013", "Mercy", "Adhiambo");
    let student_id = student.id;
    let mut registry = CheckRegistry::new();
    registry.register("FINANCE", Arc::new(ClearedCheck));
    registry.register("LIBRARY", Arc::new(BrokenCheck));
    let harness = harness_with(vec![student], registry, Arc::new(ClearedCheck)).await;

    let screenings = harness.engine.screen_student(student_id).await.unwrap();
    assert_eq!(screenings.len(), 3);

    let finance = screenings.iter().find(|s| s.department_code == "FINANCE").unwrap();
    assert!(finance.outcome.as_ref().unwrap().is_cleared);

    let library = screenings.iter().find(|s| s.department_code == "LIBRARY").unwrap();
    assert!(library.error.is_some());

    let sports = screenings.iter().find(|s| s.department_code == "SPORTS").unwrap();
    assert!(sports.manual_check_required);
}
