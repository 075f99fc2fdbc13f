use serde::{Deserialize, Serialize};

/// Which analysis strategy the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerMode {
    RuleBased,
    AssistantBacked,
}

/// Pipeline tuning knobs. All values come from the environment so thresholds
/// can move without redeploying logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub analyzer_mode: AnalyzerMode,
    /// Below this confidence the rule path forces a manual-review rejection.
    pub manual_review_floor: f64,
    /// Below this confidence an approval is tagged for mandatory verification.
    pub mandatory_check_floor: f64,
    /// `DecisionEngine`: approvals at or above this auto-approve.
    pub approve_threshold: f64,
    /// `DecisionEngine`: rejections at or below this auto-reject.
    pub reject_threshold: f64,
    pub scheduler_interval_secs: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            analyzer_mode: AnalyzerMode::RuleBased,
            manual_review_floor: 0.50,
            mandatory_check_floor: 0.60,
            approve_threshold: 0.90,
            reject_threshold: 0.10,
            scheduler_interval_secs: 30,
        }
    }
}
