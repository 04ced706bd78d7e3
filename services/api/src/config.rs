//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub openai_api_key: Option<String>,
    pub polish_model: String,
    pub expansion_model: String,
    pub category_model: String,
    pub transcription_model: String,
    pub auth_base_url: String,
    pub auth_anon_key: String,
    pub email_endpoint: String,
    pub email_access_key: String,
    pub email_from_name: String,
    pub default_recipient_path: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load AI Service Settings ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let polish_model =
            std::env::var("POLISH_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let expansion_model =
            std::env::var("EXPANSION_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let category_model =
            std::env::var("CATEGORY_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let transcription_model =
            std::env::var("TRANSCRIPTION_MODEL").unwrap_or_else(|_| "whisper-1".to_string());

        // --- Load Hosted Auth Settings ---
        let auth_base_url = std::env::var("AUTH_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("AUTH_BASE_URL".to_string()))?;
        let auth_anon_key = std::env::var("AUTH_ANON_KEY")
            .map_err(|_| ConfigError::MissingVar("AUTH_ANON_KEY".to_string()))?;

        // --- Load Email Relay Settings ---
        let email_endpoint = std::env::var("EMAIL_ENDPOINT")
            .unwrap_or_else(|_| "https://api.web3forms.com/submit".to_string());
        let email_access_key = std::env::var("EMAIL_ACCESS_KEY")
            .map_err(|_| ConfigError::MissingVar("EMAIL_ACCESS_KEY".to_string()))?;
        let email_from_name = std::env::var("EMAIL_FROM_NAME")
            .unwrap_or_else(|_| "Idea Polisher AI".to_string());

        let default_recipient_path = std::env::var("DEFAULT_RECIPIENT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/default_recipient"));

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            openai_api_key,
            polish_model,
            expansion_model,
            category_model,
            transcription_model,
            auth_base_url,
            auth_anon_key,
            email_endpoint,
            email_access_key,
            email_from_name,
            default_recipient_path,
        })
    }
}
