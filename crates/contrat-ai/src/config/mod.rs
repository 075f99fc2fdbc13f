use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::review::{AnalyzerMode, ReviewConfig};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub assistant: AssistantConfig,
    pub review: ReviewConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let assistant = AssistantConfig {
            base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.mistral.ai".to_string()),
            api_key: env::var("LLM_API_KEY").unwrap_or_default(),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| "mistral-small-latest".to_string()),
            timeout_secs: parse_number("LLM_TIMEOUT_SECONDS", 20)?,
            offline: env::var("LLM_OFFLINE")
                .map(|value| value.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };

        let analyzer_mode = match env::var("REVIEW_ANALYZER")
            .unwrap_or_else(|_| "rules".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "assistant" | "llm" => AnalyzerMode::AssistantBacked,
            _ => AnalyzerMode::RuleBased,
        };

        let defaults = ReviewConfig::default();
        let review = ReviewConfig {
            analyzer_mode,
            manual_review_floor: parse_number(
                "REVIEW_MANUAL_FLOOR",
                defaults.manual_review_floor,
            )?,
            mandatory_check_floor: parse_number(
                "REVIEW_MANDATORY_CHECK_FLOOR",
                defaults.mandatory_check_floor,
            )?,
            approve_threshold: parse_number(
                "REVIEW_AUTO_APPROVE_THRESHOLD",
                defaults.approve_threshold,
            )?,
            reject_threshold: parse_number(
                "REVIEW_AUTO_REJECT_THRESHOLD",
                defaults.reject_threshold,
            )?,
            scheduler_interval_secs: parse_number(
                "REVIEW_INTERVAL_SECONDS",
                defaults.scheduler_interval_secs,
            )?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            assistant,
            review,
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Connection settings for the external model endpoint.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Use the deterministic simulated backend instead of the network.
    pub offline: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a valid number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidNumber { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "LLM_BASE_URL",
            "LLM_API_KEY",
            "LLM_MODEL",
            "LLM_TIMEOUT_SECONDS",
            "LLM_OFFLINE",
            "REVIEW_ANALYZER",
            "REVIEW_MANUAL_FLOOR",
            "REVIEW_MANDATORY_CHECK_FLOOR",
            "REVIEW_AUTO_APPROVE_THRESHOLD",
            "REVIEW_AUTO_REJECT_THRESHOLD",
            "REVIEW_INTERVAL_SECONDS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.assistant.timeout_secs, 20);
        assert!(!config.assistant.offline);
        assert_eq!(config.review.analyzer_mode, AnalyzerMode::RuleBased);
        assert_eq!(config.review.manual_review_floor, 0.50);
        assert_eq!(config.review.mandatory_check_floor, 0.60);
        assert_eq!(config.review.scheduler_interval_secs, 30);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn selects_assistant_mode_and_overridden_thresholds() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("REVIEW_ANALYZER", "assistant");
        env::set_var("REVIEW_AUTO_APPROVE_THRESHOLD", "0.85");
        env::set_var("LLM_OFFLINE", "true");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.review.analyzer_mode, AnalyzerMode::AssistantBacked);
        assert_eq!(config.review.approve_threshold, 0.85);
        assert!(config.assistant.offline);
    }

    #[test]
    fn rejects_malformed_numeric_override() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("REVIEW_MANUAL_FLOOR", "half");
        let error = AppConfig::load().expect_err("invalid float rejected");
        assert!(matches!(error, ConfigError::InvalidNumber { name } if name == "REVIEW_MANUAL_FLOOR"));
    }
}
