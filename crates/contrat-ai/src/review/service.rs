use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use super::assistant::{AssistantBackend, AssistantError};
use super::confidence::ConfidenceScorer;
use super::config::ReviewConfig;
use super::domain::{
    AdvisorAction, AnalysisResult, Contract, ContractId, Decision, DecisionRecord, EnergyType,
    MotifCode, ReviewStatus,
};
use super::engine::{DecisionEngine, ReviewVerdict};
use super::interpreter::{single_line, ResponseInterpreter};
use super::prompt::{DateStatus, PromptBuilder};
use super::repository::{ContractStore, DecisionStore, StoreError};
use super::rules::RuleAnalyzer;

/// Analysis strategy: deterministic rules, or the external assistant.
/// A tagged variant so deployments switch by configuration, not code.
pub enum Analyzer {
    RuleBased {
        scorer: ConfidenceScorer,
    },
    AssistantBacked {
        backend: AssistantBackend,
        interpreter: ResponseInterpreter,
    },
}

impl Analyzer {
    pub async fn analyze(
        &self,
        contract: &Contract,
        now: DateTime<Utc>,
    ) -> Result<AnalysisResult, AssistantError> {
        match self {
            Analyzer::RuleBased { scorer } => {
                let mut result = RuleAnalyzer::analyze(contract, now);
                result.confidence = scorer.score(contract, &result);
                Ok(result)
            }
            Analyzer::AssistantBacked {
                backend,
                interpreter,
            } => {
                let date_status = DateStatus::from_service_start(contract.service_start, now);
                let prompt = PromptBuilder::build(contract, date_status);
                let raw = backend.chat(&prompt).await?;
                Ok(interpreter.interpret(contract, &raw))
            }
        }
    }
}

/// Inbound intake payload; the service assigns the id and queue status.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractSubmission {
    pub reference: String,
    pub email: String,
    pub telephone: String,
    pub delivery_street: String,
    pub delivery_postal_code: String,
    pub delivery_city: String,
    pub energy_type: EnergyType,
    pub consent: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub service_start: Option<DateTime<Utc>>,
    pub price: f64,
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

static CONTRACT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_contract_id() -> ContractId {
    let id = CONTRACT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ContractId(format!("ctr-{id:06}"))
}

/// Service composing the analyzer strategy, the decision engine, and the
/// stores. One instance is shared by the router and the scheduler.
pub struct ContractReviewService<C, D> {
    contracts: Arc<C>,
    decisions: Arc<D>,
    analyzer: Analyzer,
    engine: DecisionEngine,
    config: ReviewConfig,
}

impl<C, D> ContractReviewService<C, D>
where
    C: ContractStore + 'static,
    D: DecisionStore + 'static,
{
    pub fn new(contracts: Arc<C>, decisions: Arc<D>, analyzer: Analyzer, config: ReviewConfig) -> Self {
        let engine = DecisionEngine::from_config(&config);
        Self {
            contracts,
            decisions,
            analyzer,
            engine,
            config,
        }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Intake: screen the submission and enqueue it unless auto-rejected.
    ///
    /// The decision engine runs before any contract is created; a KO verdict
    /// means nothing is persisted.
    pub async fn submit(
        &self,
        submission: ContractSubmission,
        now: DateTime<Utc>,
    ) -> Result<(Option<Contract>, AnalysisResult, ReviewVerdict), ReviewServiceError> {
        let contract = Contract {
            id: next_contract_id(),
            reference: submission.reference,
            email: submission.email,
            telephone: submission.telephone,
            delivery_street: submission.delivery_street,
            delivery_postal_code: submission.delivery_postal_code,
            delivery_city: submission.delivery_city,
            energy_type: submission.energy_type,
            consent: submission.consent,
            signed_at: submission.signed_at,
            service_start: submission.service_start,
            price: submission.price,
            review_status: ReviewStatus::Pending,
        };

        let result = self.review_contract(&contract, now).await?;
        let verdict = self.engine.decide(&result);

        if verdict == ReviewVerdict::Ko {
            info!(contract = %contract.reference, "intake auto-rejected, contract not enqueued");
            return Ok((None, result, verdict));
        }

        let stored = self.contracts.insert(contract)?;
        Ok((Some(stored), result, verdict))
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn find_contract(&self, id: &ContractId) -> Result<Option<Contract>, StoreError> {
        self.contracts.find_by_id(id)
    }

    pub fn latest_decision(&self, id: &ContractId) -> Result<Option<DecisionRecord>, StoreError> {
        self.decisions.find_latest_by_contract(id)
    }

    pub fn pending_contracts(&self) -> Result<Vec<Contract>, StoreError> {
        self.contracts.find_pending()
    }

    /// Derive the final analysis for one contract without persisting anything.
    pub async fn review_contract(
        &self,
        contract: &Contract,
        now: DateTime<Utc>,
    ) -> Result<AnalysisResult, ReviewServiceError> {
        let result = self.analyzer.analyze(contract, now).await?;
        Ok(self.apply_confidence_floors(result))
    }

    /// Post-scoring override: very low confidence forces a manual-review
    /// rejection; low-but-passable confidence keeps the approval but tags a
    /// mandatory verification. Parse failures are left untouched so the
    /// PARSING_ERROR outcome survives to the audit trail.
    pub(crate) fn apply_confidence_floors(&self, result: AnalysisResult) -> AnalysisResult {
        if result.motif_code == MotifCode::ParsingError {
            return result;
        }

        if result.confidence < self.config.manual_review_floor {
            return AnalysisResult {
                decision: Decision::Reject,
                motif_code: MotifCode::ManualReview,
                motif: "Score de confiance insuffisant - Revue manuelle requise".to_string(),
                action_conseiller: AdvisorAction::Examine,
                details: format!(
                    "Le score de confiance de {:.2} est inférieur au seuil de {:.2}. Une revue manuelle par un conseiller est nécessaire.",
                    result.confidence, self.config.manual_review_floor
                ),
                confidence: result.confidence,
            };
        }

        if result.confidence < self.config.mandatory_check_floor {
            return AnalysisResult {
                decision: Decision::Approve,
                motif_code: MotifCode::MandatoryCheck,
                motif: "Score de confiance faible - Vérification obligatoire requise".to_string(),
                action_conseiller: AdvisorAction::MandatoryCheck,
                details: format!(
                    "Le score de confiance de {:.2} est inférieur au seuil de {:.2}. Une vérification obligatoire est nécessaire avant traitement.",
                    result.confidence, self.config.mandatory_check_floor
                ),
                confidence: result.confidence,
            };
        }

        result
    }

    /// Review one pending contract and persist the outcome.
    ///
    /// Success writes the audit row, then flips the contract to PROCESSED; if
    /// the status flip fails the contract stays PENDING and the next pass
    /// reviews it again (at-least-once). Analysis failure writes an ERROR
    /// audit row and leaves the contract PENDING.
    pub async fn process_one(
        &self,
        contract: &Contract,
        now: DateTime<Utc>,
    ) -> Result<AnalysisResult, ReviewServiceError> {
        info!(contract = %contract.id.0, reference = %contract.reference, "reviewing contract");

        match self.review_contract(contract, now).await {
            Ok(result) => {
                self.decisions
                    .save(DecisionRecord::success(contract.id.clone(), result.clone(), now))?;

                let mut processed = contract.clone();
                processed.review_status = ReviewStatus::Processed;
                self.contracts.save(&processed)?;

                info!(
                    contract = %contract.id.0,
                    decision = result.decision.label(),
                    motif_code = result.motif_code.label(),
                    action = result.action_conseiller.label(),
                    confidence = result.confidence,
                    "contract review recorded"
                );
                if !result.details.is_empty() {
                    info!(contract = %contract.id.0, details = %single_line(&result.details), "advisor details");
                }
                Ok(result)
            }
            Err(err) => {
                error!(contract = %contract.id.0, %err, "contract review failed");
                // Audit row even on failure; a second store failure here is
                // logged and swallowed so the caller sees the original error.
                if let Err(audit_err) = self
                    .decisions
                    .save(DecisionRecord::failure(contract.id.clone(), err.to_string(), now))
                {
                    error!(contract = %contract.id.0, %audit_err, "failed to record error audit row");
                }
                Err(err)
            }
        }
    }
}
