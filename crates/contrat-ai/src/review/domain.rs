use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for contracts awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub String);

/// Energy supplied by the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyType {
    #[serde(rename = "ELECTRICITE")]
    Electricite,
    #[serde(rename = "GAZ")]
    Gaz,
    #[serde(rename = "DUAL")]
    Dual,
}

/// Queue state of a contract with respect to the review pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "PROCESSED")]
    Processed,
}

impl ReviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "PENDING",
            ReviewStatus::Processed => "PROCESSED",
        }
    }
}

/// Snapshot of a subscription contract submitted for automated screening.
///
/// Owned by the persistence layer; the scheduler is the only writer of
/// `review_status` and flips it exactly once per successful pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
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
    pub review_status: ReviewStatus,
}

/// Coarse decision surfaced to other subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "VALIDE")]
    Approve,
    #[serde(rename = "REJET")]
    Reject,
    #[serde(rename = "REVIEW")]
    Review,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Decision::Approve => "VALIDE",
            Decision::Reject => "REJET",
            Decision::Review => "REVIEW",
        }
    }

    /// Lenient mapping from assistant output; `None` when unrecognized.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "VALIDE" | "APPROVE" | "APPROVED" => Some(Decision::Approve),
            "REJET" | "REJECT" | "REJECTED" => Some(Decision::Reject),
            "REVIEW" | "EN_ATTENTE" => Some(Decision::Review),
            _ => None,
        }
    }
}

/// Enumerable reason behind a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotifCode {
    #[serde(rename = "CONSENT_MISSING")]
    ConsentMissing,
    #[serde(rename = "SIGNATURE_MISSING")]
    SignatureMissing,
    #[serde(rename = "EMAIL_INVALID")]
    EmailInvalid,
    #[serde(rename = "PHONE_INVALID")]
    PhoneInvalid,
    #[serde(rename = "DATE_INCOHERENT")]
    DateIncoherent,
    #[serde(rename = "ADDRESS_INVALID")]
    AddressInvalid,
    #[serde(rename = "VALID")]
    Valid,
    #[serde(rename = "REVUE_MANUELLE")]
    ManualReview,
    #[serde(rename = "VERIFICATION_OBLIGATOIRE")]
    MandatoryCheck,
    #[serde(rename = "PARSING_ERROR")]
    ParsingError,
    #[serde(rename = "ANALYSIS_ERROR")]
    AnalysisError,
}

impl MotifCode {
    pub const fn label(self) -> &'static str {
        match self {
            MotifCode::ConsentMissing => "CONSENT_MISSING",
            MotifCode::SignatureMissing => "SIGNATURE_MISSING",
            MotifCode::EmailInvalid => "EMAIL_INVALID",
            MotifCode::PhoneInvalid => "PHONE_INVALID",
            MotifCode::DateIncoherent => "DATE_INCOHERENT",
            MotifCode::AddressInvalid => "ADDRESS_INVALID",
            MotifCode::Valid => "VALID",
            MotifCode::ManualReview => "REVUE_MANUELLE",
            MotifCode::MandatoryCheck => "VERIFICATION_OBLIGATOIRE",
            MotifCode::ParsingError => "PARSING_ERROR",
            MotifCode::AnalysisError => "ANALYSIS_ERROR",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CONSENT_MISSING" | "CONSENTMENT_FALSE" => Some(MotifCode::ConsentMissing),
            "SIGNATURE_MISSING" => Some(MotifCode::SignatureMissing),
            "EMAIL_INVALID" => Some(MotifCode::EmailInvalid),
            "PHONE_INVALID" => Some(MotifCode::PhoneInvalid),
            "DATE_INCOHERENT" => Some(MotifCode::DateIncoherent),
            "ADDRESS_INVALID" => Some(MotifCode::AddressInvalid),
            "VALID" | "CONTRACT_VALID" => Some(MotifCode::Valid),
            "REVUE_MANUELLE" => Some(MotifCode::ManualReview),
            "VERIFICATION_OBLIGATOIRE" => Some(MotifCode::MandatoryCheck),
            "PARSING_ERROR" => Some(MotifCode::ParsingError),
            "ANALYSIS_ERROR" => Some(MotifCode::AnalysisError),
            _ => None,
        }
    }
}

/// Next-step hint for a human reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvisorAction {
    #[serde(rename = "TRAITER")]
    Process,
    #[serde(rename = "EXAMINER")]
    Examine,
    #[serde(rename = "VERIFICATION_OBLIGATOIRE")]
    MandatoryCheck,
}

impl AdvisorAction {
    pub const fn label(self) -> &'static str {
        match self {
            AdvisorAction::Process => "TRAITER",
            AdvisorAction::Examine => "EXAMINER",
            AdvisorAction::MandatoryCheck => "VERIFICATION_OBLIGATOIRE",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        // The assistant sometimes returns the accented spelling.
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                'É' | 'È' | 'Ê' | 'é' | 'è' | 'ê' => 'E',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        match normalized.as_str() {
            "TRAITER" => Some(AdvisorAction::Process),
            "EXAMINER" => Some(AdvisorAction::Examine),
            "VERIFICATION_OBLIGATOIRE" => Some(AdvisorAction::MandatoryCheck),
            _ => None,
        }
    }
}

/// Structured judgment produced by one review attempt. Immutable once built;
/// its serde shape is the wire format consumed by other subsystems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub decision: Decision,
    pub motif_code: MotifCode,
    pub motif: String,
    pub action_conseiller: AdvisorAction,
    pub details: String,
    pub confidence: f64,
}

impl AnalysisResult {
    pub fn reject(code: MotifCode, motif: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            decision: Decision::Reject,
            motif_code: code,
            motif: motif.into(),
            action_conseiller: AdvisorAction::Examine,
            details: details.into(),
            confidence: 1.0,
        }
    }

    pub fn approve_valid() -> Self {
        Self {
            decision: Decision::Approve,
            motif_code: MotifCode::Valid,
            motif: "Contrat conforme aux règles de gestion".to_string(),
            action_conseiller: AdvisorAction::Process,
            details: "Toutes les informations du contrat sont valides et conformes".to_string(),
            confidence: 1.0,
        }
    }

    pub fn parsing_error(details: impl Into<String>) -> Self {
        Self {
            decision: Decision::Review,
            motif_code: MotifCode::ParsingError,
            motif: "Réponse de l'assistant inexploitable".to_string(),
            action_conseiller: AdvisorAction::Examine,
            details: details.into(),
            confidence: 0.0,
        }
    }
}

/// Processing state of an audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "PENDING")]
    Pending,
}

impl ProcessStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProcessStatus::Success => "SUCCESS",
            ProcessStatus::Error => "ERROR",
            ProcessStatus::Pending => "PENDING",
        }
    }
}

/// Append-only audit row linking a contract to an analysis snapshot.
/// The most recent row per contract is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub contract_id: ContractId,
    pub result: AnalysisResult,
    pub process_status: ProcessStatus,
    pub error_message: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn success(contract_id: ContractId, result: AnalysisResult, now: DateTime<Utc>) -> Self {
        Self {
            contract_id,
            result,
            process_status: ProcessStatus::Success,
            error_message: None,
            processed_at: now,
        }
    }

    pub fn failure(contract_id: ContractId, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            contract_id,
            result: AnalysisResult {
                decision: Decision::Review,
                motif_code: MotifCode::AnalysisError,
                motif: "Erreur lors de l'analyse du contrat".to_string(),
                action_conseiller: AdvisorAction::Examine,
                details: String::new(),
                confidence: 0.0,
            },
            process_status: ProcessStatus::Error,
            error_message: Some(message.into()),
            processed_at: now,
        }
    }
}
