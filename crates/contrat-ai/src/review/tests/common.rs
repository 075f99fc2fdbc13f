use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::review::confidence::{ConfidenceScorer, NoUncertainty};
use crate::review::domain::{
    Contract, ContractId, DecisionRecord, EnergyType, MotifCode, ProcessStatus, ReviewStatus,
};
use crate::review::repository::{ContractStore, DecisionStore, StoreError};
use crate::review::service::{Analyzer, ContractReviewService, ContractSubmission};
use crate::review::ReviewConfig;

pub(super) fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-10T09:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

/// Contract that passes every rule with no confidence penalty.
pub(super) fn valid_contract() -> Contract {
    Contract {
        id: ContractId("ctr-000042".to_string()),
        reference: "CNT-2026-0042".to_string(),
        email: "claire.martin@example.com".to_string(),
        telephone: "0145020304".to_string(),
        delivery_street: "12 rue Victor Hugo".to_string(),
        delivery_postal_code: "75015".to_string(),
        delivery_city: "Paris".to_string(),
        energy_type: EnergyType::Electricite,
        consent: true,
        signed_at: Some(fixed_now() - Duration::days(1)),
        service_start: Some(fixed_now() + Duration::days(5)),
        price: 89.90,
        review_status: ReviewStatus::Pending,
    }
}

pub(super) fn valid_submission() -> ContractSubmission {
    let contract = valid_contract();
    ContractSubmission {
        reference: contract.reference,
        email: contract.email,
        telephone: contract.telephone,
        delivery_street: contract.delivery_street,
        delivery_postal_code: contract.delivery_postal_code,
        delivery_city: contract.delivery_city,
        energy_type: contract.energy_type,
        consent: contract.consent,
        signed_at: contract.signed_at,
        service_start: contract.service_start,
        price: contract.price,
    }
}

pub(super) fn review_config() -> ReviewConfig {
    ReviewConfig::default()
}

/// Rule-based analyzer with perturbation disabled, for reproducible scores.
pub(super) fn deterministic_analyzer() -> Analyzer {
    Analyzer::RuleBased {
        scorer: ConfidenceScorer::new(Box::new(NoUncertainty)),
    }
}

pub(super) fn rule_service(
    contracts: Arc<MemoryContracts>,
    decisions: Arc<MemoryDecisions>,
) -> ContractReviewService<MemoryContracts, MemoryDecisions> {
    ContractReviewService::new(contracts, decisions, deterministic_analyzer(), review_config())
}

#[derive(Default)]
pub(super) struct MemoryContracts {
    rows: Mutex<HashMap<String, Contract>>,
}

impl MemoryContracts {
    pub(super) fn seed(&self, contract: Contract) {
        self.rows
            .lock()
            .expect("contracts mutex")
            .insert(contract.id.0.clone(), contract);
    }

    pub(super) fn status_of(&self, id: &ContractId) -> Option<ReviewStatus> {
        self.rows
            .lock()
            .expect("contracts mutex")
            .get(&id.0)
            .map(|contract| contract.review_status)
    }
}

impl ContractStore for MemoryContracts {
    fn insert(&self, contract: Contract) -> Result<Contract, StoreError> {
        let mut rows = self.rows.lock().expect("contracts mutex");
        if rows.contains_key(&contract.id.0) {
            return Err(StoreError::Conflict);
        }
        rows.insert(contract.id.0.clone(), contract.clone());
        Ok(contract)
    }

    fn save(&self, contract: &Contract) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().expect("contracts mutex");
        if !rows.contains_key(&contract.id.0) {
            return Err(StoreError::NotFound);
        }
        rows.insert(contract.id.0.clone(), contract.clone());
        Ok(())
    }

    fn find_by_id(&self, id: &ContractId) -> Result<Option<Contract>, StoreError> {
        Ok(self
            .rows
            .lock()
            .expect("contracts mutex")
            .get(&id.0)
            .cloned())
    }

    fn find_pending(&self) -> Result<Vec<Contract>, StoreError> {
        let rows = self.rows.lock().expect("contracts mutex");
        let mut pending: Vec<Contract> = rows
            .values()
            .filter(|contract| contract.review_status == ReviewStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(pending)
    }
}

#[derive(Default)]
pub(super) struct MemoryDecisions {
    rows: Mutex<Vec<DecisionRecord>>,
}

impl MemoryDecisions {
    pub(super) fn records(&self) -> Vec<DecisionRecord> {
        self.rows.lock().expect("decisions mutex").clone()
    }
}

impl DecisionStore for MemoryDecisions {
    fn save(&self, record: DecisionRecord) -> Result<(), StoreError> {
        self.rows.lock().expect("decisions mutex").push(record);
        Ok(())
    }

    fn find_latest_by_contract(
        &self,
        id: &ContractId,
    ) -> Result<Option<DecisionRecord>, StoreError> {
        let rows = self.rows.lock().expect("decisions mutex");
        Ok(rows
            .iter()
            .filter(|record| record.contract_id == *id)
            .max_by_key(|record| record.processed_at)
            .cloned())
    }

    fn find_by_status(&self, status: ProcessStatus) -> Result<Vec<DecisionRecord>, StoreError> {
        let rows = self.rows.lock().expect("decisions mutex");
        Ok(rows
            .iter()
            .filter(|record| record.process_status == status)
            .cloned()
            .collect())
    }

    fn find_by_motif(&self, code: MotifCode) -> Result<Vec<DecisionRecord>, StoreError> {
        let rows = self.rows.lock().expect("decisions mutex");
        Ok(rows
            .iter()
            .filter(|record| record.result.motif_code == code)
            .cloned()
            .collect())
    }
}

/// Contract store that fails every call, for error-path coverage.
pub(super) struct UnavailableContracts;

impl ContractStore for UnavailableContracts {
    fn insert(&self, _contract: Contract) -> Result<Contract, StoreError> {
        Err(StoreError::Unavailable("contracts down".to_string()))
    }

    fn save(&self, _contract: &Contract) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("contracts down".to_string()))
    }

    fn find_by_id(&self, _id: &ContractId) -> Result<Option<Contract>, StoreError> {
        Err(StoreError::Unavailable("contracts down".to_string()))
    }

    fn find_pending(&self) -> Result<Vec<Contract>, StoreError> {
        Err(StoreError::Unavailable("contracts down".to_string()))
    }
}

/// Decision store that refuses writes but keeps nothing.
pub(super) struct UnavailableDecisions;

impl DecisionStore for UnavailableDecisions {
    fn save(&self, _record: DecisionRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("decisions down".to_string()))
    }

    fn find_latest_by_contract(
        &self,
        _id: &ContractId,
    ) -> Result<Option<DecisionRecord>, StoreError> {
        Err(StoreError::Unavailable("decisions down".to_string()))
    }

    fn find_by_status(&self, _status: ProcessStatus) -> Result<Vec<DecisionRecord>, StoreError> {
        Err(StoreError::Unavailable("decisions down".to_string()))
    }

    fn find_by_motif(&self, _code: MotifCode) -> Result<Vec<DecisionRecord>, StoreError> {
        Err(StoreError::Unavailable("decisions down".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
