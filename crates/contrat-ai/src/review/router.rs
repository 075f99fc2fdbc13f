use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use super::domain::ContractId;
use super::engine::ReviewVerdict;
use super::repository::{ContractReviewView, ContractStore, DecisionStore};
use super::scheduler::ContractReviewScheduler;
use super::service::{ContractReviewService, ContractSubmission, ReviewServiceError};

/// Shared handler state: the review service plus the scheduler for the
/// manual-trigger endpoint.
pub struct ReviewState<C, D> {
    pub service: Arc<ContractReviewService<C, D>>,
    pub scheduler: Arc<ContractReviewScheduler<C, D>>,
}

impl<C, D> Clone for ReviewState<C, D> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

/// Router builder exposing HTTP endpoints for intake, decisions, and the
/// manual scheduler trigger.
pub fn review_router<C, D>(state: ReviewState<C, D>) -> Router
where
    C: ContractStore + 'static,
    D: DecisionStore + 'static,
{
    Router::new()
        .route("/api/v1/contrats", post(submit_handler::<C, D>))
        .route(
            "/api/v1/contrats/:contract_id/decision",
            get(decision_handler::<C, D>),
        )
        .route(
            "/api/v1/contrats/process-pending",
            post(process_pending_handler::<C, D>),
        )
        .with_state(state)
}

pub(crate) async fn submit_handler<C, D>(
    State(state): State<ReviewState<C, D>>,
    axum::Json(submission): axum::Json<ContractSubmission>,
) -> Response
where
    C: ContractStore + 'static,
    D: DecisionStore + 'static,
{
    match state.service.submit(submission, Utc::now()).await {
        Ok((contract, result, verdict)) => {
            if verdict == ReviewVerdict::Ko {
                let payload = json!({
                    "verdict": verdict.label(),
                    "analysis": result,
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
            let payload = json!({
                "contract_id": contract.map(|c| c.id.0),
                "verdict": verdict.label(),
                "analysis": result,
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(ReviewServiceError::Assistant(error)) => {
            warn!(%error, "intake screening failed, assistant unavailable");
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn decision_handler<C, D>(
    State(state): State<ReviewState<C, D>>,
    Path(contract_id): Path<String>,
) -> Response
where
    C: ContractStore + 'static,
    D: DecisionStore + 'static,
{
    let id = ContractId(contract_id);
    let contract = match state.service.find_contract(&id) {
        Ok(Some(contract)) => contract,
        Ok(None) => {
            let payload = json!({
                "error": "contract not found",
            });
            return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };

    match state.service.latest_decision(&id) {
        Ok(latest) => {
            let view = ContractReviewView::from_parts(&contract, latest.as_ref());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn process_pending_handler<C, D>(
    State(state): State<ReviewState<C, D>>,
) -> Response
where
    C: ContractStore + 'static,
    D: DecisionStore + 'static,
{
    match state.scheduler.run_once().await {
        Ok(summary) if summary.skipped => {
            let payload = json!({
                "message": "un passage de revue est déjà en cours",
                "skipped": true,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(summary) => {
            let payload = json!({
                "message": format!(
                    "{} contrat(s) traités, {} en erreur",
                    summary.processed, summary.failed
                ),
                "processed": summary.processed,
                "failed": summary.failed,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}
