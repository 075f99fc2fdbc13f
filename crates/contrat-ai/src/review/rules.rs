use chrono::{DateTime, Duration, Utc};

use super::domain::{AnalysisResult, Contract, MotifCode};

const DISPOSABLE_DOMAINS: &[&str] = &[
    "@yopmail",
    "@tempmail",
    "@10minutemail",
    "@mailinator",
    "@guerrillamail",
    "@throwaway",
];

const FAKE_ADDRESS_MARKERS: &[&str] = &["test", "fake", "demo", "exemple"];

/// Deterministic rule evaluation over a contract snapshot.
///
/// Rules run in a fixed priority order and short-circuit at the first
/// violation; there is no partial scoring here. Confidence is filled in by
/// the scorer afterwards.
pub struct RuleAnalyzer;

impl RuleAnalyzer {
    pub fn analyze(contract: &Contract, now: DateTime<Utc>) -> AnalysisResult {
        if !contract.consent {
            return AnalysisResult::reject(
                MotifCode::ConsentMissing,
                "Consentement client obligatoire non coché",
                "Le client n'a pas donné son consentement pour la souscription du contrat",
            );
        }

        if contract.signed_at.is_none() {
            return AnalysisResult::reject(
                MotifCode::SignatureMissing,
                "Date de signature manquante",
                "Le contrat doit être signé pour être valide",
            );
        }

        if !is_valid_email(&contract.email) {
            return AnalysisResult::reject(
                MotifCode::EmailInvalid,
                "Format d'email invalide",
                format!(
                    "L'email '{}' n'est pas valide ou provient d'un service temporaire",
                    contract.email
                ),
            );
        }

        if !is_valid_phone(&contract.telephone) {
            return AnalysisResult::reject(
                MotifCode::PhoneInvalid,
                "Numéro de téléphone invalide",
                format!(
                    "Le numéro de téléphone '{}' n'est pas un format valide",
                    contract.telephone
                ),
            );
        }

        if !service_start_is_coherent(contract.service_start, now) {
            return AnalysisResult::reject(
                MotifCode::DateIncoherent,
                "Date de mise en service incohérente",
                "La date de mise en service doit être au minimum dans 2 jours",
            );
        }

        if !is_valid_address(&contract.delivery_street) {
            return AnalysisResult::reject(
                MotifCode::AddressInvalid,
                "Adresse de livraison invalide",
                format!(
                    "L'adresse de livraison '{}' ne semble pas être une adresse réelle",
                    contract.delivery_street
                ),
            );
        }

        AnalysisResult::approve_valid()
    }
}

pub(crate) fn service_start_is_coherent(
    service_start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match service_start {
        Some(start) => start > now + Duration::days(2),
        None => false,
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() {
        return false;
    }

    if email.contains("@@") || email.contains("..") || email.starts_with('@') || email.ends_with('@')
    {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-'));
    let domain_ok = !domain.is_empty()
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'));
    if !local_ok || !domain_ok {
        return false;
    }

    let lower = email.to_lowercase();
    !DISPOSABLE_DOMAINS
        .iter()
        .any(|marker| lower.contains(marker))
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    let cleaned: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.'))
        .collect();

    if cleaned.len() != 10 || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    // French national format: leading 0 then a non-zero routing digit.
    let mut chars = cleaned.chars();
    chars.next() == Some('0') && matches!(chars.next(), Some('1'..='9'))
}

pub(crate) fn is_valid_address(street: &str) -> bool {
    let cleaned = street.trim().to_lowercase();
    if cleaned.is_empty() {
        return false;
    }

    if FAKE_ADDRESS_MARKERS
        .iter()
        .any(|marker| cleaned.contains(marker))
    {
        return false;
    }

    // "rue de la paix" with nothing else is a placeholder, not an address.
    if cleaned.contains("rue de la paix") && cleaned.len() < 20 {
        return false;
    }

    if is_over_simple(&cleaned) {
        return false;
    }

    cleaned.len() >= 10 && cleaned.chars().any(|c| c.is_ascii_digit()) && has_word(&cleaned, 3)
}

/// Shapes like "1 rue" — a number followed by one short token.
fn is_over_simple(cleaned: &str) -> bool {
    let rest = cleaned.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == cleaned.len() {
        return false;
    }
    let token = rest.trim();
    !token.is_empty() && token.len() <= 5 && token.chars().all(|c| c.is_ascii_lowercase())
}

fn has_word(value: &str, min_len: usize) -> bool {
    let mut run = 0usize;
    for c in value.chars() {
        if c.is_alphabetic() {
            run += 1;
            if run >= min_len {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}
