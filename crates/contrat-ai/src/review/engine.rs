use serde::{Deserialize, Serialize};

use super::config::ReviewConfig;
use super::domain::{AnalysisResult, Decision};

/// Coarse outcome used by the request-intake pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewVerdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "KO")]
    Ko,
    #[serde(rename = "REVIEW")]
    Review,
}

impl ReviewVerdict {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewVerdict::Ok => "OK",
            ReviewVerdict::Ko => "KO",
            ReviewVerdict::Review => "REVIEW",
        }
    }
}

/// Threshold-based tie-breaking over a structured result. Pure and total.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    approve_threshold: f64,
    reject_threshold: f64,
}

impl DecisionEngine {
    pub fn new(approve_threshold: f64, reject_threshold: f64) -> Self {
        Self {
            approve_threshold,
            reject_threshold,
        }
    }

    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(config.approve_threshold, config.reject_threshold)
    }

    pub fn decide(&self, result: &AnalysisResult) -> ReviewVerdict {
        if result.decision == Decision::Approve && result.confidence >= self.approve_threshold {
            return ReviewVerdict::Ok;
        }
        if result.decision == Decision::Reject && result.confidence <= self.reject_threshold {
            return ReviewVerdict::Ko;
        }
        ReviewVerdict::Review
    }
}
