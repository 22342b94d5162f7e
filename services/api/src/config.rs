use std::net::SocketAddr;
use tracing::Level;

use coach_core::session::DEFAULT_QUESTION_TIME_LIMIT;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported backends for question generation and scoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Groq,
    OpenAI,
    /// Deterministic engine with no external calls, for local development.
    Static,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub log_level: Level,
    pub question_time_limit: u32,
    pub max_retry_attempts: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "groq".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "openai" => Provider::OpenAI,
            "static" => Provider::Static,
            _ => Provider::Groq,
        };

        let groq_api_key = std::env::var("GROQ_API_KEY").ok();
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| match provider {
            Provider::OpenAI => "gpt-4o".to_string(),
            _ => "llama-3.3-70b-versatile".to_string(),
        });

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let question_time_limit = match std::env::var("QUESTION_TIME_LIMIT") {
            Ok(raw) => raw.parse::<u32>().ok().filter(|v| *v > 0).ok_or_else(|| {
                ConfigError::InvalidValue("QUESTION_TIME_LIMIT".to_string(), raw.clone())
            })?,
            Err(_) => DEFAULT_QUESTION_TIME_LIMIT,
        };

        let max_retry_attempts = match std::env::var("MAX_RETRY_ATTEMPTS") {
            Ok(raw) => raw.parse::<u32>().ok().filter(|v| *v > 0).ok_or_else(|| {
                ConfigError::InvalidValue("MAX_RETRY_ATTEMPTS".to_string(), raw.clone())
            })?,
            Err(_) => 3,
        };

        match provider {
            Provider::Groq => {
                if groq_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "GROQ_API_KEY must be set for 'groq' provider".to_string(),
                    ));
                }
            }
            Provider::OpenAI => {
                if openai_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                    ));
                }
            }
            Provider::Static => {}
        }

        Ok(Self {
            bind_address,
            provider,
            groq_api_key,
            openai_api_key,
            chat_model,
            log_level,
            question_time_limit,
            max_retry_attempts,
        })
    }
}
