//! Gemini provider
//!
//! Talks to the Generative Language API (`generateContent`) with function
//! declarations. Configuration comes from the `[model]` section; the API
//! key is read from the environment variable it names.

pub mod gateway;
pub mod session;
pub mod types;

pub use gateway::GeminiLlmGateway;
pub use session::GeminiSession;

use crate::config::FileModelConfig;
use relay_application::ports::llm_gateway::GatewayError;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Resolved Gemini settings
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub model: String,
    pub api_key: String,
    /// Name of the variable the key came from (for error messages)
    pub api_key_env: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub temperature: Option<f32>,
}

impl GeminiConfig {
    /// Resolve settings from `[model]`, reading the key from the environment.
    pub fn from_model_config(config: &FileModelConfig) -> Result<Self, GatewayError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                GatewayError::AuthenticationFailed(format!(
                    "Gemini requires an API key. Set {}",
                    config.api_key_env
                ))
            })?;

        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
            .to_string();

        Ok(Self {
            model: config.name.trim().to_string(),
            api_key,
            api_key_env: config.api_key_env.clone(),
            base_url,
            request_timeout_secs: config.request_timeout_secs,
            temperature: config.temperature,
        })
    }
}
