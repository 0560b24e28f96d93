//! Gemini LLM Gateway implementation

use super::GeminiConfig;
use super::session::GeminiSession;
use async_trait::async_trait;
use relay_application::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// LLM Gateway speaking the Gemini `generateContent` API over HTTPS
pub struct GeminiLlmGateway {
    client: reqwest::Client,
    config: Arc<GeminiConfig>,
}

impl GeminiLlmGateway {
    pub fn new(config: GeminiConfig) -> Result<Self, GatewayError> {
        if config.api_key.trim().is_empty() {
            return Err(GatewayError::AuthenticationFailed(format!(
                "Gemini API key is empty. Set {}",
                config.api_key_env
            )));
        }
        if config.model.trim().is_empty() {
            return Err(GatewayError::SessionError(
                "Gemini model name cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl LlmGateway for GeminiLlmGateway {
    async fn start(
        &self,
        system_prompt: &str,
        tools: &[serde_json::Value],
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        info!(model = %self.config.model, tools = tools.len(), "Starting Gemini session");
        Ok(Box::new(GeminiSession::new(
            self.client.clone(),
            self.config.clone(),
            system_prompt,
            tools,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str) -> GeminiConfig {
        GeminiConfig {
            model: "gemini-2.0-flash".to_string(),
            api_key: api_key.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 5,
            temperature: None,
        }
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = GeminiLlmGateway::new(config("  ")).err().unwrap();
        assert!(matches!(err, GatewayError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn test_start_does_not_contact_the_api() {
        let gateway = GeminiLlmGateway::new(config("k")).unwrap();
        let session = gateway.start("prompt", &[]).await.unwrap();
        assert_eq!(session.model(), "gemini-2.0-flash");
    }
}
