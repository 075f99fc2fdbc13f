use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::review::repository::ContractStore;
use crate::review::router::{review_router, ReviewState};
use crate::review::scheduler::ContractReviewScheduler;
use crate::review::service::ContractReviewService;
use crate::review::ReviewConfig;

fn state_with(
    contracts: Arc<MemoryContracts>,
    decisions: Arc<MemoryDecisions>,
    config: ReviewConfig,
) -> ReviewState<MemoryContracts, MemoryDecisions> {
    let service = Arc::new(ContractReviewService::new(
        contracts,
        decisions,
        deterministic_analyzer(),
        config,
    ));
    let scheduler = Arc::new(ContractReviewScheduler::new(
        Arc::clone(&service),
        Duration::from_secs(30),
    ));
    ReviewState { service, scheduler }
}

/// `valid_contract()` with dates re-anchored to the real clock, because the
/// submit handler and scheduler evaluate rules against `Utc::now()` rather
/// than the fixed test clock.
fn wall_clock_contract() -> crate::review::domain::Contract {
    let now = chrono::Utc::now();
    let mut contract = valid_contract();
    contract.signed_at = Some(now - chrono::Duration::days(1));
    contract.service_start = Some(now + chrono::Duration::days(5));
    contract
}

fn submission_json() -> Value {
    let contract = wall_clock_contract();
    json!({
        "reference": contract.reference,
        "email": contract.email,
        "telephone": contract.telephone,
        "delivery_street": contract.delivery_street,
        "delivery_postal_code": contract.delivery_postal_code,
        "delivery_city": contract.delivery_city,
        "energy_type": "ELECTRICITE",
        "consent": contract.consent,
        "signed_at": contract.signed_at,
        "service_start": contract.service_start,
        "price": contract.price,
    })
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn submit_returns_accepted_with_verdict() {
    let contracts = Arc::new(MemoryContracts::default());
    let decisions = Arc::new(MemoryDecisions::default());
    let app = review_router(state_with(contracts, decisions, review_config()));

    let response = app
        .oneshot(post("/api/v1/contrats", submission_json()))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = read_json_body(response).await;
    assert_eq!(body["verdict"], "OK");
    assert!(body["contract_id"].as_str().expect("id present").starts_with("ctr-"));
    assert_eq!(body["analysis"]["decision"], "VALIDE");
}

#[tokio::test]
async fn submit_rejects_auto_rejected_contracts() {
    let contracts = Arc::new(MemoryContracts::default());
    let decisions = Arc::new(MemoryDecisions::default());
    let config = ReviewConfig {
        reject_threshold: 0.80,
        ..review_config()
    };
    let app = review_router(state_with(Arc::clone(&contracts), decisions, config));

    let mut body = submission_json();
    body["delivery_street"] = json!("1 rue");

    let response = app
        .oneshot(post("/api/v1/contrats", body))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["verdict"], "KO");
    assert_eq!(body["analysis"]["motifCode"], "ADDRESS_INVALID");
    assert!(contracts.find_pending().expect("store up").is_empty());
}

#[tokio::test]
async fn decision_endpoint_reports_pending_before_processing() {
    let contracts = Arc::new(MemoryContracts::default());
    let decisions = Arc::new(MemoryDecisions::default());
    contracts.seed(valid_contract());
    let app = review_router(state_with(contracts, decisions, review_config()));

    let response = app
        .oneshot(get("/api/v1/contrats/ctr-000042/decision"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["review_status"], "PENDING");
    assert_eq!(body["decision"], Value::Null);
}

#[tokio::test]
async fn decision_endpoint_returns_latest_record_after_processing() {
    let contracts = Arc::new(MemoryContracts::default());
    let decisions = Arc::new(MemoryDecisions::default());
    contracts.seed(wall_clock_contract());
    let state = state_with(Arc::clone(&contracts), Arc::clone(&decisions), review_config());
    let app = review_router(state.clone());

    state.scheduler.run_once().await.expect("pass runs");

    let response = app
        .oneshot(get("/api/v1/contrats/ctr-000042/decision"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["review_status"], "PROCESSED");
    assert_eq!(body["decision"], "VALIDE");
    assert_eq!(body["confidence"], 1.0);
}

#[tokio::test]
async fn decision_endpoint_misses_unknown_contracts() {
    let contracts = Arc::new(MemoryContracts::default());
    let decisions = Arc::new(MemoryDecisions::default());
    let app = review_router(state_with(contracts, decisions, review_config()));

    let response = app
        .oneshot(get("/api/v1/contrats/ctr-999999/decision"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn process_pending_endpoint_reports_counts() {
    let contracts = Arc::new(MemoryContracts::default());
    let decisions = Arc::new(MemoryDecisions::default());
    contracts.seed(valid_contract());
    let app = review_router(state_with(Arc::clone(&contracts), decisions, review_config()));

    let response = app
        .oneshot(post("/api/v1/contrats/process-pending", json!({})))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["processed"], 1);
    assert_eq!(body["failed"], 0);
    assert!(contracts.find_pending().expect("store up").is_empty());
}

#[tokio::test]
async fn process_pending_endpoint_surfaces_store_failures() {
    let service = Arc::new(ContractReviewService::new(
        Arc::new(UnavailableContracts),
        Arc::new(MemoryDecisions::default()),
        deterministic_analyzer(),
        review_config(),
    ));
    let scheduler = Arc::new(ContractReviewScheduler::new(
        Arc::clone(&service),
        Duration::from_secs(30),
    ));
    let app = review_router(ReviewState { service, scheduler });

    let response = app
        .oneshot(post("/api/v1/contrats/process-pending", json!({})))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
