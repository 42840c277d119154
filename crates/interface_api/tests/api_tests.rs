//! HTTP-level tests over the workflow engines with in-memory stores

use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use core_kernel::{
    CheckError, CheckOutcome, CheckRegistry, EligibilityCheck, StaffId, StudentId,
};
use domain_promotion::{ports::mock::MockPromotionStore, PromotionEngine};
use domain_readmission::{ports::mock::MockReAdmissionStore, ReAdmissionEngine};
use domain_student::{ports::mock::MockAcademicCalendar, Student, StudentStatus};
use domain_transfer::{ports::mock::MockTransferStore, TransferWorkflowEngine};
use interface_api::{config::ApiConfig, create_router, AppState};
use test_utils::{academic_year, standard_departments, EnrollmentBuilder, StudentBuilder};

struct SettledFees;

#[async_trait]
impl EligibilityCheck for SettledFees {
    fn name(&self) -> &str {
        "settled-fees"
    }

    async fn check(&self, _student_id: StudentId) -> Result<CheckOutcome, CheckError> {
        Ok(CheckOutcome::cleared())
    }
}

struct Harness {
    server: TestServer,
    transfer_store: Arc<MockTransferStore>,
    readmission_store: Arc<MockReAdmissionStore>,
    promotion_store: Arc<MockPromotionStore>,
    calendar: Arc<MockAcademicCalendar>,
    actor: StaffId,
}

impl Harness {
    async fn new() -> Self {
        let transfer_store = Arc::new(
            MockTransferStore::with_data(vec![], standard_departments()).await,
        );
        let readmission_store = Arc::new(MockReAdmissionStore::new());
        let promotion_store = Arc::new(MockPromotionStore::new());
        let calendar = Arc::new(MockAcademicCalendar::new());

        let numbers = Arc::new(core_kernel::numbering::mock::CountingNumberGenerator::new());
        let state = AppState {
            transfers: Arc::new(TransferWorkflowEngine::new(
                transfer_store.clone(),
                Arc::new(CheckRegistry::new()),
                numbers.clone(),
                Arc::new(SettledFees),
            )),
            readmissions: Arc::new(ReAdmissionEngine::new(
                readmission_store.clone(),
                numbers,
            )),
            promotions: Arc::new(PromotionEngine::new(
                promotion_store.clone(),
                calendar.clone(),
            )),
            pool: PgPoolOptions::new()
                .connect_lazy("postgres://localhost/school_test")
                .unwrap(),
            config: ApiConfig::default(),
        };

        Self {
            server: TestServer::new(create_router(state)).unwrap(),
            transfer_store,
            readmission_store,
            promotion_store,
            calendar,
            actor: StaffId::new(),
        }
    }

    async fn with_student(student: Student) -> Self {
        let harness = Self::new().await;
        harness.transfer_store.insert_student(student).await;
        harness
    }

    fn initiate_body(&self, student: &Student) -> Value {
        json!({
            "student_id": Uuid::from(student.id),
            "transfer_type": "external",
            "reason": "Family relocating to Mombasa",
            "request_date": "2026-08-14",
            "destination_school": "Coast Academy",
            "requested_by": Uuid::from(self.actor),
        })
    }

    /// Clears every seeded department manually and settles fees, landing the
    /// transfer on pending_approval
    async fn drive_to_pending_approval(&self, transfer_id: &str) {
        for code in ["FINANCE", "LIBRARY", "SPORTS"] {
            let response = self
                .server
                .put(&format!("/api/v1/transfers/{}/clearances/{}", transfer_id, code))
                .json(&json!({"status": "cleared", "actor": Uuid::from(self.actor)}))
                .await;
            response.assert_status_ok();
        }
        let response = self
            .server
            .post(&format!("/api/v1/transfers/{}/fees/verification", transfer_id))
            .json(&json!({"actor": Uuid::from(self.actor)}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["transfer_status"], "pending_approval");
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let harness = Harness::new().await;
    let response = harness.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_external_transfer_full_workflow() {
    let student = StudentBuilder::new().with_admission_no("ADM-9001").build();
    let harness = Harness::with_student(student.clone()).await;

    // Initiate
    let response = harness
        .server
        .post("/api/v1/transfers")
        .json(&harness.initiate_body(&student))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body = response.json::<Value>();
    assert!(body["transfer_no"].as_str().unwrap().starts_with("TRF-"));
    assert_eq!(body["status"], "pending_clearance");
    let transfer_id = body["id"].as_str().unwrap().to_string();

    // Clearances and fee settlement
    harness.drive_to_pending_approval(&transfer_id).await;

    // Approval
    let response = harness
        .server
        .post(&format!("/api/v1/transfers/{}/approval", transfer_id))
        .json(&json!({"outcome": "approved", "actor": Uuid::from(harness.actor)}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "documents_ready");

    // Documents: certificate number generated when not supplied
    let response = harness
        .server
        .post(&format!("/api/v1/transfers/{}/documents", transfer_id))
        .json(&json!({"actor": Uuid::from(harness.actor)}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["leaving_certificate_no"]
        .as_str()
        .unwrap()
        .starts_with("LC-"));

    // Completion marks the student transferred
    let response = harness
        .server
        .post(&format!("/api/v1/transfers/{}/completion", transfer_id))
        .json(&json!({"effective_date": "2026-09-01", "actor": Uuid::from(harness.actor)}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "completed");

    let stored = harness
        .transfer_store
        .student_snapshot(student.id)
        .await
        .unwrap();
    assert_eq!(stored.status, StudentStatus::Transferred);
}

#[tokio::test]
async fn test_second_open_transfer_is_a_conflict() {
    let student = StudentBuilder::new().with_admission_no("ADM-9002").build();
    let harness = Harness::with_student(student.clone()).await;

    let response = harness
        .server
        .post("/api/v1/transfers")
        .json(&harness.initiate_body(&student))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let response = harness
        .server
        .post("/api/v1/transfers")
        .json(&harness.initiate_body(&student))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "conflict");
}

#[tokio::test]
async fn test_missing_reason_is_a_validation_error() {
    let student = StudentBuilder::new().with_admission_no("ADM-9003").build();
    let harness = Harness::with_student(student.clone()).await;

    let mut body = harness.initiate_body(&student);
    body["reason"] = json!("  ");
    let response = harness.server.post("/api/v1/transfers").json(&body).await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"], "validation_error");
}

#[tokio::test]
async fn test_unknown_transfer_returns_not_found() {
    let harness = Harness::new().await;
    let response = harness
        .server
        .get(&format!("/api/v1/transfers/{}", Uuid::new_v4()))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_approval_before_clearance_is_a_conflict() {
    let student = StudentBuilder::new().with_admission_no("ADM-9004").build();
    let harness = Harness::with_student(student.clone()).await;

    let response = harness
        .server
        .post("/api/v1/transfers")
        .json(&harness.initiate_body(&student))
        .await;
    let transfer_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let response = harness
        .server
        .post(&format!("/api/v1/transfers/{}/approval", transfer_id))
        .json(&json!({"outcome": "approved", "actor": Uuid::from(harness.actor)}))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_readmission_full_workflow() {
    let student = StudentBuilder::new()
        .with_admission_no("ADM-9005")
        .with_status(StudentStatus::Transferred)
        .build();
    let harness = Harness::new().await;
    harness.readmission_store.insert_student(student.clone()).await;
    harness
        .readmission_store
        .set_balance(student.id, dec!(1500.00))
        .await;

    let target_class = Uuid::new_v4();
    let target_stream = Uuid::new_v4();
    let response = harness
        .server
        .post("/api/v1/readmissions")
        .json(&json!({
            "student_id": Uuid::from(student.id),
            "target_class_id": target_class,
            "target_stream_id": target_stream,
            "readmission_date": "2027-01-10",
            "reason": "Family moved back to the area",
            "exit_reason": "Family relocated",
            "requested_by": Uuid::from(harness.actor),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body = response.json::<Value>();
    assert!(body["readmission_no"].as_str().unwrap().starts_with("RADM-"));
    assert_eq!(body["status"], "pending_review");
    assert_eq!(body["previous_fee_balance"], "1500.00");
    let id = body["id"].as_str().unwrap().to_string();

    let response = harness
        .server
        .post(&format!("/api/v1/readmissions/{}/review", id))
        .json(&json!({"notes": "Documents requested", "actor": Uuid::from(harness.actor)}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "documents_verification");

    let response = harness
        .server
        .post(&format!("/api/v1/readmissions/{}/decision", id))
        .json(&json!({
            "outcome": "approved",
            "fee_waiver_amount": "500.00",
            "fee_waiver_reason": "Hardship waiver",
            "actor": Uuid::from(harness.actor),
        }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "approved");
    assert_eq!(body["fee_waiver_granted"], true);

    let response = harness
        .server
        .post(&format!("/api/v1/readmissions/{}/completion", id))
        .json(&json!({"actor": Uuid::from(harness.actor)}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "completed");

    let stored = harness
        .readmission_store
        .student_snapshot(student.id)
        .await
        .unwrap();
    assert_eq!(stored.status, StudentStatus::Active);
    assert_eq!(stored.class_id.map(Uuid::from), Some(target_class));
    assert_eq!(stored.stream_id.map(Uuid::from), Some(target_stream));
}

#[tokio::test]
async fn test_active_student_readmission_rejected() {
    let student = StudentBuilder::new().with_admission_no("ADM-9006").build();
    let harness = Harness::new().await;
    harness.readmission_store.insert_student(student.clone()).await;

    let response = harness
        .server
        .post("/api/v1/readmissions")
        .json(&json!({
            "student_id": Uuid::from(student.id),
            "target_class_id": Uuid::new_v4(),
            "target_stream_id": Uuid::new_v4(),
            "readmission_date": "2027-01-10",
            "reason": "Wants to return",
            "requested_by": Uuid::from(harness.actor),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_single_student_promotion() {
    let harness = Harness::new().await;
    let from_year = academic_year(2026, true);
    let to_year = academic_year(2027, false);
    harness.calendar.insert_year(from_year.clone()).await;
    harness.calendar.insert_year(to_year.clone()).await;

    let student = StudentBuilder::new().with_admission_no("ADM-9007").build();
    let enrollment = EnrollmentBuilder::new(student.id, from_year.id).build();
    let to_class = core_kernel::ClassId::new();
    let to_stream = core_kernel::StreamId::new();
    harness.promotion_store.insert_student(student.clone()).await;
    harness.promotion_store.insert_enrollment(enrollment).await;
    harness
        .promotion_store
        .register_class(to_class, to_stream, "Grade 5 East")
        .await;

    let response = harness
        .server
        .post("/api/v1/promotions/student")
        .json(&json!({
            "student_id": Uuid::from(student.id),
            "to_class_id": Uuid::from(to_class),
            "to_stream_id": Uuid::from(to_stream),
            "from_year_id": Uuid::from(from_year.id),
            "to_year_id": Uuid::from(to_year.id),
            "actor": Uuid::from(harness.actor),
        }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["promotion_status"], "pending");
    assert_eq!(
        body["academic_year_id"].as_str().unwrap(),
        Uuid::from(to_year.id).to_string()
    );
    assert_eq!(harness.promotion_store.history_len().await, 1);
}

#[tokio::test]
async fn test_promotion_without_enrollment_is_a_conflict() {
    let harness = Harness::new().await;
    let from_year = academic_year(2026, true);
    let to_year = academic_year(2027, false);
    harness.calendar.insert_year(from_year.clone()).await;
    harness.calendar.insert_year(to_year.clone()).await;

    let student = StudentBuilder::new().with_admission_no("ADM-9008").build();
    harness.promotion_store.insert_student(student.clone()).await;

    let response = harness
        .server
        .post("/api/v1/promotions/student")
        .json(&json!({
            "student_id": Uuid::from(student.id),
            "to_class_id": Uuid::new_v4(),
            "to_stream_id": Uuid::new_v4(),
            "from_year_id": Uuid::from(from_year.id),
            "to_year_id": Uuid::from(to_year.id),
            "actor": Uuid::from(harness.actor),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}
