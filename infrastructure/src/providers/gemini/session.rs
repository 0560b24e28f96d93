//! Gemini LLM session implementation
//!
//! `generateContent` is stateless, so the session keeps the conversation
//! history locally and sends all of it on every call.

use super::GeminiConfig;
use super::types::{
    self, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ROLE_MODEL,
    Tool,
};
use async_trait::async_trait;
use relay_application::ports::llm_gateway::{GatewayError, LlmSession};
use relay_domain::{Message, ModelResponse};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct GeminiSession {
    client: reqwest::Client,
    config: Arc<GeminiConfig>,
    system_prompt: String,
    tools: Vec<Tool>,
    /// Conversation history (`user` and `model` turns)
    contents: Mutex<Vec<Content>>,
}

impl GeminiSession {
    pub fn new(
        client: reqwest::Client,
        config: Arc<GeminiConfig>,
        system_prompt: &str,
        declarations: &[serde_json::Value],
    ) -> Self {
        Self {
            client,
            config,
            system_prompt: system_prompt.to_string(),
            tools: types::convert_declarations(declarations),
            contents: Mutex::new(Vec::new()),
        }
    }

    /// Number of turns in the local history
    pub async fn history_len(&self) -> usize {
        self.contents.lock().await.len()
    }

    fn endpoint(&self) -> String {
        let model = if self.config.model.starts_with("models/") {
            self.config.model.clone()
        } else {
            format!("models/{}", self.config.model)
        };
        format!(
            "{}/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate(&self, contents: &[Content]) -> Result<Content, GatewayError> {
        let body = GenerateContentRequest {
            system_instruction: (!self.system_prompt.is_empty())
                .then(|| Content::system(&self.system_prompt)),
            contents,
            tools: self.tools.clone(),
            generation_config: self.config.temperature.map(|temperature| GenerationConfig {
                temperature: Some(temperature),
            }),
        };

        debug!(
            model = %self.config.model,
            contents = contents.len(),
            "Calling Gemini generateContent"
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::ConnectionError(format!(
                        "could not reach Gemini at {}: {}",
                        self.config.base_url, e
                    ))
                } else if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::RequestFailed(format!("failed to read response: {}", e)))?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GatewayError::AuthenticationFailed(format!(
                "Gemini returned {}. Check {}",
                status, self.config.api_key_env
            )));
        }
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "Gemini returned {}: {}",
                status,
                text.trim()
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            GatewayError::InvalidResponse(format!("failed to parse Gemini response: {}", e))
        })?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            let feedback = parsed
                .prompt_feedback
                .map(|f| f.to_string())
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(GatewayError::InvalidResponse(format!(
                "Gemini returned no candidates: {}",
                feedback
            )));
        };

        let mut content = candidate.content.unwrap_or(Content {
            role: None,
            parts: Vec::new(),
        });
        if content.parts.is_empty() {
            warn!(
                finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
                "Gemini returned an empty candidate"
            );
        }
        content.role = Some(ROLE_MODEL.to_string());
        Ok(content)
    }
}

#[async_trait]
impl LlmSession for GeminiSession {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send(&self, message: &Message) -> Result<ModelResponse, GatewayError> {
        let mut contents = self.contents.lock().await;
        let previous = contents.clone();
        types::push_user_turn(&mut contents, types::convert_message(message));

        match self.generate(&contents).await {
            Ok(reply) => {
                let response = types::convert_content(&reply);
                // An empty model turn is not accepted back by the API
                if !reply.parts.is_empty() {
                    contents.push(reply);
                }
                Ok(response)
            }
            Err(e) => {
                *contents = previous;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;
    use relay_domain::ToolOutcome;
    use serde_json::json;

    fn config(base_url: String) -> Arc<GeminiConfig> {
        Arc::new(GeminiConfig {
            model: "gemini-2.0-flash".to_string(),
            api_key: "test-key".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url,
            request_timeout_secs: 5,
            temperature: Some(0.2),
        })
    }

    fn declarations() -> Vec<serde_json::Value> {
        vec![json!({
            "name": "getAvailableMargin",
            "description": "Available margin in USD",
            "parameters": {"type": "object", "required": [], "properties": {}}
        })]
    }

    #[tokio::test]
    async fn test_send_parses_function_calls_and_keeps_history() {
        let (base, request) = serve_once(
            "200 OK",
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [
                        {"functionCall": {"name": "getAvailableMargin", "args": {}}}
                    ]},
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .await;

        let session = GeminiSession::new(
            reqwest::Client::new(),
            config(base),
            "Be careful.",
            &declarations(),
        );
        let response = session.send(&Message::task("Check the margin")).await.unwrap();

        assert_eq!(response.kind(), "calls");
        assert_eq!(session.history_len().await, 2);
        assert_eq!(session.model(), "gemini-2.0-flash");

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /models/gemini-2.0-flash:generateContent?key=test-key"));
        let body: serde_json::Value =
            serde_json::from_str(&raw[raw.find("\r\n\r\n").unwrap() + 4..]).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be careful.");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Check the margin");
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "getAvailableMargin"
        );
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_answering_first_call_only_trims_model_turn() {
        let (base, request) = serve_once(
            "200 OK",
            json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Done."}]}}]
            })
            .to_string(),
        )
        .await;
        let session = GeminiSession::new(reqwest::Client::new(), config(base), "", &[]);
        {
            let mut contents = session.contents.lock().await;
            contents.push(types::convert_message(&Message::task("Check margin and positions")));
            contents.push(
                serde_json::from_value(json!({
                    "role": "model",
                    "parts": [
                        {"functionCall": {"name": "getAvailableMargin", "args": {}}},
                        {"functionCall": {"name": "getPositions", "args": {}}}
                    ]
                }))
                .unwrap(),
            );
        }

        let response = session
            .send(&Message::Outcomes(vec![ToolOutcome::success(
                "getAvailableMargin",
                json!({"usd": 12500}),
            )]))
            .await
            .unwrap();
        assert_eq!(response, ModelResponse::text("Done."));

        let raw = request.await.unwrap();
        let body: serde_json::Value =
            serde_json::from_str(&raw[raw.find("\r\n\r\n").unwrap() + 4..]).unwrap();
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(
            contents[1]["parts"],
            json!([{"functionCall": {"name": "getAvailableMargin", "args": {}}}])
        );
        assert_eq!(
            contents[2]["parts"],
            json!([{"functionResponse": {"name": "getAvailableMargin", "response": {"result": {"usd": 12500}}}}])
        );
        assert_eq!(session.history_len().await, 4);
    }

    #[tokio::test]
    async fn test_failed_send_restores_history() {
        let (base, _request) = serve_once("500 Internal Server Error", "{}").await;
        let session = GeminiSession::new(reqwest::Client::new(), config(base), "", &[]);
        let model_turn: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                {"functionCall": {"name": "getAvailableMargin", "args": {}}},
                {"functionCall": {"name": "getPositions", "args": {}}}
            ]
        }))
        .unwrap();
        {
            let mut contents = session.contents.lock().await;
            contents.push(types::convert_message(&Message::task("Check")));
            contents.push(model_turn.clone());
        }

        let err = session
            .send(&Message::Outcomes(vec![ToolOutcome::success(
                "getPositions",
                json!([]),
            )]))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::RequestFailed(_)));
        let contents = session.contents.lock().await;
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1], model_turn);
    }

    #[tokio::test]
    async fn test_auth_failure() {
        let (base, _request) = serve_once("403 Forbidden", r#"{"error": {}}"#).await;
        let session = GeminiSession::new(reqwest::Client::new(), config(base), "", &[]);

        let err = session
            .send(&Message::Outcomes(vec![ToolOutcome::success("t", json!(1))]))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AuthenticationFailed(_)));
        assert_eq!(session.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_no_candidates_is_invalid_response() {
        let (base, _request) = serve_once(
            "200 OK",
            r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#,
        )
        .await;
        let session = GeminiSession::new(reqwest::Client::new(), config(base), "", &[]);

        let err = session.send(&Message::task("hi")).await.unwrap_err();
        match err {
            GatewayError::InvalidResponse(message) => assert!(message.contains("SAFETY")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let session = GeminiSession::new(
            reqwest::Client::new(),
            config(format!("http://{}", addr)),
            "",
            &[],
        );
        let err = session.send(&Message::task("hi")).await.unwrap_err();
        assert!(matches!(err, GatewayError::ConnectionError(_)));
    }
}
