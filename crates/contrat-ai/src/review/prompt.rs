use chrono::{DateTime, Utc};

use super::domain::Contract;
use super::rules::service_start_is_coherent;

/// Backend-computed verdict on the service-start date. The assistant never
/// performs date arithmetic; it only reads this status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStatus {
    Coherente,
    Incoherente,
}

impl DateStatus {
    pub fn from_service_start(service_start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if service_start_is_coherent(service_start, now) {
            DateStatus::Coherente
        } else {
            DateStatus::Incoherente
        }
    }

    const fn label(self) -> &'static str {
        match self {
            DateStatus::Coherente => "COHERENTE (au minimum 2 jours dans le futur)",
            DateStatus::Incoherente => "INCOHERENTE (absente, passée ou trop proche)",
        }
    }
}

/// Serializes contract fields into one instruction block for the assistant.
///
/// Byte-deterministic for identical input: no clocks, no randomness, so
/// golden-prompt tests can compare full strings.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(contract: &Contract, date_status: DateStatus) -> String {
        format!(
            "\
Tu es un expert en analyse de contrats d'énergie pour un fournisseur français.
Analyse ce contrat selon les règles de gestion strictes et donne une décision précise.

DONNÉES DU CONTRAT:
• Numéro de contrat: {reference}
• Email client: {email}
• Téléphone: {telephone}
• Adresse de livraison: {street}
• Code postal: {postal}
• Ville: {city}
• Signature présente: {signed}
• Consentement client: {consent}
• Statut de la date de mise en service (calculé par le back-office): {date_status}
• Prix: {price} €

RÈGLES DE GESTION À VÉRIFIER:
1. CONSENTEMENT: le client doit avoir explicitement donné son consentement (true)
2. SIGNATURE: la signature doit être présente
3. EMAIL: format valide, pas d'adresse temporaire (yopmail, tempmail, 10minutemail, mailinator, guerrillamail, throwaway)
4. TÉLÉPHONE: format français (10 chiffres commençant par 01-09)
5. DATE MISE EN SERVICE: utilise uniquement le statut calculé ci-dessus, ne fais aucun calcul de date
6. ADRESSE: réaliste et complète (numéro + rue), et le code postal doit correspondre à la ville: 75xxx => Paris, 69xxx => Lyon

FORMAT DE RÉPONSE OBLIGATOIRE (JSON exact):
{{
    \"decision\": \"VALIDE\" | \"REJET\",
    \"motifCode\": \"VALID | CONSENT_MISSING | SIGNATURE_MISSING | EMAIL_INVALID | PHONE_INVALID | DATE_INCOHERENT | ADDRESS_INVALID\",
    \"motif\": \"Description professionnelle de la décision\",
    \"actionConseiller\": \"TRAITER | EXAMINER | VERIFICATION_OBLIGATOIRE\",
    \"details\": \"Explication pour le conseiller, sur une seule ligne, sans retour à la ligne\",
    \"confidence\": 0.95
}}

INSTRUCTIONS IMPORTANTES:
- Réponds UNIQUEMENT en JSON valide, sans texte avant ou après
- Le champ details doit tenir sur une seule ligne
- Le score de confiance (0.0 à 1.0) doit refléter la certitude de ta décision
- En cas de doute, privilégie la prudence",
            reference = contract.reference,
            email = contract.email,
            telephone = contract.telephone,
            street = contract.delivery_street,
            postal = contract.delivery_postal_code,
            city = contract.delivery_city,
            signed = contract.signed_at.is_some(),
            consent = contract.consent,
            date_status = date_status.label(),
            price = contract.price,
        )
    }
}
