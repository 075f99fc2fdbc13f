use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use contrat_ai::config::AppConfig;
use contrat_ai::review::{
    Analyzer, AnalyzerMode, AssistantBackend, AssistantError, ConfidenceScorer, Contract,
    ContractId, ContractStore, DecisionRecord, DecisionStore, MotifCode, ProcessStatus,
    ResponseInterpreter, ReviewStatus, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local contract store. Durable persistence sits behind the same
/// trait in deployments backed by a database.
#[derive(Default, Clone)]
pub(crate) struct InMemoryContractStore {
    rows: Arc<Mutex<HashMap<ContractId, Contract>>>,
}

impl ContractStore for InMemoryContractStore {
    fn insert(&self, contract: Contract) -> Result<Contract, StoreError> {
        let mut guard = self.rows.lock().expect("contract store mutex poisoned");
        if guard.contains_key(&contract.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(contract.id.clone(), contract.clone());
        Ok(contract)
    }

    fn save(&self, contract: &Contract) -> Result<(), StoreError> {
        let mut guard = self.rows.lock().expect("contract store mutex poisoned");
        if !guard.contains_key(&contract.id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(contract.id.clone(), contract.clone());
        Ok(())
    }

    fn find_by_id(&self, id: &ContractId) -> Result<Option<Contract>, StoreError> {
        let guard = self.rows.lock().expect("contract store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_pending(&self) -> Result<Vec<Contract>, StoreError> {
        let guard = self.rows.lock().expect("contract store mutex poisoned");
        let mut pending: Vec<Contract> = guard
            .values()
            .filter(|contract| contract.review_status == ReviewStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(pending)
    }
}

/// Append-only audit log of review decisions.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDecisionStore {
    rows: Arc<Mutex<Vec<DecisionRecord>>>,
}

impl DecisionStore for InMemoryDecisionStore {
    fn save(&self, record: DecisionRecord) -> Result<(), StoreError> {
        let mut guard = self.rows.lock().expect("decision store mutex poisoned");
        guard.push(record);
        Ok(())
    }

    fn find_latest_by_contract(
        &self,
        id: &ContractId,
    ) -> Result<Option<DecisionRecord>, StoreError> {
        let guard = self.rows.lock().expect("decision store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.contract_id == *id)
            .max_by_key(|record| record.processed_at)
            .cloned())
    }

    fn find_by_status(&self, status: ProcessStatus) -> Result<Vec<DecisionRecord>, StoreError> {
        let guard = self.rows.lock().expect("decision store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.process_status == status)
            .cloned()
            .collect())
    }

    fn find_by_motif(&self, code: MotifCode) -> Result<Vec<DecisionRecord>, StoreError> {
        let guard = self.rows.lock().expect("decision store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.result.motif_code == code)
            .cloned()
            .collect())
    }
}

/// Assemble the configured analysis strategy.
pub(crate) fn build_analyzer(config: &AppConfig) -> Result<Analyzer, AssistantError> {
    Ok(match config.review.analyzer_mode {
        AnalyzerMode::RuleBased => Analyzer::RuleBased {
            scorer: ConfidenceScorer::seeded(0x434f_4e54),
        },
        AnalyzerMode::AssistantBacked => Analyzer::AssistantBacked {
            backend: AssistantBackend::from_config(&config.assistant)?,
            interpreter: ResponseInterpreter,
        },
    })
}
