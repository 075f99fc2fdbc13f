use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AssistantConfig;

use super::confidence::Xorshift64;

/// Failure calling the external model endpoint. Never retried within a pass;
/// the next scheduled pass retries the contract.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant unavailable ({status}): {body}")]
    Unavailable { status: u16, body: String },
    #[error("assistant returned an empty or choice-less response")]
    EmptyResponse,
    #[error("assistant transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Assistant transport. A tagged variant rather than a trait object so the
/// deployment mode is plain configuration data.
pub enum AssistantBackend {
    Http(HttpAssistantClient),
    Simulated(SimulatedAssistant),
}

impl AssistantBackend {
    pub fn from_config(config: &AssistantConfig) -> Result<Self, AssistantError> {
        if config.offline {
            Ok(AssistantBackend::Simulated(SimulatedAssistant::default()))
        } else {
            Ok(AssistantBackend::Http(HttpAssistantClient::new(config)?))
        }
    }

    pub async fn chat(&self, prompt: &str) -> Result<String, AssistantError> {
        match self {
            AssistantBackend::Http(client) => client.chat(prompt).await,
            AssistantBackend::Simulated(sim) => Ok(sim.chat(prompt)),
        }
    }
}

/// Blocking-style remote call bounded by the configured timeout; a timeout
/// fails the call instead of hanging.
pub struct HttpAssistantClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpAssistantClient {
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub async fn chat(&self, prompt: &str) -> Result<String, AssistantError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.7,
            stream: false,
        };

        info!(url = %url, prompt_len = prompt.len(), "calling assistant endpoint");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("<missing location>")
                .to_string();
            warn!(status = status.as_u16(), location = %location, "assistant redirected");
            return Err(AssistantError::Unavailable {
                status: status.as_u16(),
                body: format!("redirection to {location}"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "assistant returned an error status");
            return Err(AssistantError::Unavailable {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(AssistantError::EmptyResponse)?;
        if content.trim().is_empty() {
            return Err(AssistantError::EmptyResponse);
        }

        debug!(content_len = content.len(), "assistant answered");
        Ok(content)
    }
}

/// Offline simulation for environments without network access to the model
/// provider. Keyword-driven, with a seeded weighted draw when no keyword
/// matches, so runs are reproducible.
pub struct SimulatedAssistant {
    rng: Mutex<Xorshift64>,
}

impl Default for SimulatedAssistant {
    fn default() -> Self {
        Self::seeded(0x5eed_cafe)
    }
}

impl SimulatedAssistant {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(Xorshift64::new(seed)),
        }
    }

    pub fn chat(&self, prompt: &str) -> String {
        // Keywords are matched verbatim so the uppercase schema tokens in the
        // prompt itself never trigger a branch.
        let kind = if prompt.contains("urgent") || prompt.contains("prioritaire") {
            SimulatedKind::Approve
        } else if prompt.contains("refus") || prompt.contains("rejet") || prompt.contains("invalide")
        {
            SimulatedKind::Reject
        } else if prompt.contains("vérification") || prompt.contains("validation") {
            SimulatedKind::Review
        } else {
            let draw = self
                .rng
                .lock()
                .expect("simulated assistant mutex poisoned")
                .next_percent();
            match draw {
                0..=59 => SimulatedKind::Approve,
                60..=79 => SimulatedKind::Review,
                _ => SimulatedKind::Reject,
            }
        };

        debug!(?kind, "simulated assistant responding");
        kind.payload().to_string()
    }
}

#[derive(Debug, Clone, Copy)]
enum SimulatedKind {
    Approve,
    Review,
    Reject,
}

impl SimulatedKind {
    fn payload(self) -> &'static str {
        match self {
            SimulatedKind::Approve => {
                "Analyse terminée.\n\n```json\n{\"decision\":\"VALIDE\",\"motifCode\":\"VALID\",\"motif\":\"Contrat conforme aux règles de gestion\",\"actionConseiller\":\"TRAITER\",\"details\":\"Toutes les informations du contrat sont valides et conformes\",\"confidence\":0.92}\n```"
            }
            SimulatedKind::Review => {
                "Analyse terminée.\n\n```json\n{\"decision\":\"REVIEW\",\"motifCode\":\"VERIFICATION_OBLIGATOIRE\",\"motif\":\"Points nécessitant une attention particulière\",\"actionConseiller\":\"VERIFICATION_OBLIGATOIRE\",\"details\":\"Score intermédiaire, validation humaine requise\",\"confidence\":0.72}\n```"
            }
            SimulatedKind::Reject => {
                "Analyse terminée.\n\n```json\n{\"decision\":\"REJET\",\"motifCode\":\"EMAIL_INVALID\",\"motif\":\"Demande non conforme aux critères minimum\",\"actionConseiller\":\"EXAMINER\",\"details\":\"Plusieurs points bloquants identifiés\",\"confidence\":0.95}\n```"
            }
        }
    }
}
