//! Contract eligibility screening pipeline.
//!
//! A submitted energy contract flows through an analyzer (deterministic rules
//! or an external assistant), gets a confidence score, passes through the
//! decision engine's thresholds, and lands in the audit trail. A background
//! scheduler drains the pending queue on a fixed interval.

pub mod assistant;
pub mod config;
pub(crate) mod confidence;
pub mod domain;
pub mod engine;
pub mod interpreter;
pub mod prompt;
pub mod repository;
pub mod router;
pub(crate) mod rules;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod tests;

pub use assistant::{AssistantBackend, AssistantError, HttpAssistantClient, SimulatedAssistant};
pub use config::{AnalyzerMode, ReviewConfig};
pub use confidence::{ConfidenceScorer, NoUncertainty, UncertaintySource, Xorshift64};
pub use domain::{
    AdvisorAction, AnalysisResult, Contract, ContractId, Decision, DecisionRecord, EnergyType,
    MotifCode, ProcessStatus, ReviewStatus,
};
pub use engine::{DecisionEngine, ReviewVerdict};
pub use interpreter::ResponseInterpreter;
pub use prompt::{DateStatus, PromptBuilder};
pub use repository::{ContractReviewView, ContractStore, DecisionStore, StoreError};
pub use router::{review_router, ReviewState};
pub use scheduler::{ContractReviewScheduler, PassSummary};
pub use service::{Analyzer, ContractReviewService, ContractSubmission, ReviewServiceError};
