use serde::Serialize;

use super::domain::{Contract, ContractId, DecisionRecord, MotifCode, ProcessStatus};

/// Storage abstraction for contracts so the pipeline can be exercised in
/// isolation. The persistence layer serializes the pending queue.
pub trait ContractStore: Send + Sync {
    fn insert(&self, contract: Contract) -> Result<Contract, StoreError>;
    fn save(&self, contract: &Contract) -> Result<(), StoreError>;
    fn find_by_id(&self, id: &ContractId) -> Result<Option<Contract>, StoreError>;
    fn find_pending(&self) -> Result<Vec<Contract>, StoreError>;
}

/// Append-only audit store; rows are never updated.
pub trait DecisionStore: Send + Sync {
    fn save(&self, record: DecisionRecord) -> Result<(), StoreError>;
    /// Most recent record for a contract, ordered by `processed_at` descending.
    fn find_latest_by_contract(&self, id: &ContractId) -> Result<Option<DecisionRecord>, StoreError>;
    fn find_by_status(&self, status: ProcessStatus) -> Result<Vec<DecisionRecord>, StoreError>;
    fn find_by_motif(&self, code: MotifCode) -> Result<Vec<DecisionRecord>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized representation of a contract's review state for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ContractReviewView {
    pub contract_id: ContractId,
    pub review_status: &'static str,
    pub decision: Option<String>,
    pub motif: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ContractReviewView {
    pub fn from_parts(contract: &Contract, latest: Option<&DecisionRecord>) -> Self {
        Self {
            contract_id: contract.id.clone(),
            review_status: contract.review_status.label(),
            decision: latest.map(|record| record.result.decision.label().to_string()),
            motif: latest.map(|record| record.result.motif.clone()),
            confidence: latest.map(|record| record.result.confidence),
        }
    }
}
