//! Scripted LLM gateway
//!
//! Replays a fixed list of model responses. Used for `--script` dry runs
//! and for deterministic tests of the whole stack.
//!
//! # Script format
//!
//! ```json
//! [
//!   {"calls": [{"name": "getAvailableMargin", "arguments": {}}]},
//!   {"text": "Balance OK.", "delay_ms": 250},
//!   {"error": "upstream reset"}
//! ]
//! ```
//!
//! Each `send` consumes one step. `delay_ms` sleeps before answering;
//! an `error` step fails the send. Running past the end of the script is
//! a transport failure.

use async_trait::async_trait;
use relay_application::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use relay_domain::{Message, ModelResponse, ToolCall};
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a script
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("could not read script {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct ScriptedCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ScriptedReply {
    Calls { calls: Vec<ScriptedCall> },
    Text { text: String },
    Error { error: String },
}

/// One scripted answer
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStep {
    #[serde(flatten)]
    reply: ScriptedReply,
    #[serde(default)]
    delay_ms: u64,
}

impl ScriptStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            reply: ScriptedReply::Text {
                text: content.into(),
            },
            delay_ms: 0,
        }
    }

    pub fn calls(calls: Vec<ToolCall>) -> Self {
        Self {
            reply: ScriptedReply::Calls {
                calls: calls
                    .into_iter()
                    .map(|call| ScriptedCall {
                        arguments: call.arguments_json(),
                        name: call.tool_name,
                    })
                    .collect(),
            },
            delay_ms: 0,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            reply: ScriptedReply::Error {
                error: message.into(),
            },
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    fn resolve(&self) -> Result<ModelResponse, GatewayError> {
        match &self.reply {
            ScriptedReply::Text { text } => Ok(ModelResponse::text(text.as_str())),
            ScriptedReply::Calls { calls } => Ok(ModelResponse::calls(
                calls
                    .iter()
                    .map(|c| ToolCall::from_json(c.name.as_str(), c.arguments.clone()))
                    .collect(),
            )),
            ScriptedReply::Error { error } => Err(GatewayError::RequestFailed(error.clone())),
        }
    }
}

/// What the gateway has seen so far, shared with its sessions
#[derive(Debug, Default)]
struct Recording {
    system_prompts: Vec<String>,
    declarations: Vec<serde_json::Value>,
    messages: Vec<Message>,
}

/// Gateway replaying a script; every session starts from the first step.
#[derive(Clone)]
pub struct ScriptedLlmGateway {
    steps: Arc<Vec<ScriptStep>>,
    recording: Arc<Mutex<Recording>>,
}

impl ScriptedLlmGateway {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Arc::new(steps),
            recording: Arc::new(Mutex::new(Recording::default())),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every message received by any session, in arrival order
    pub fn received_messages(&self) -> Vec<Message> {
        self.recording
            .lock()
            .map(|r| r.messages.clone())
            .unwrap_or_default()
    }

    /// Declarations passed to the most recent `start`
    pub fn declarations(&self) -> Vec<serde_json::Value> {
        self.recording
            .lock()
            .map(|r| r.declarations.clone())
            .unwrap_or_default()
    }

    /// System prompts of every `start`, in order
    pub fn system_prompts(&self) -> Vec<String> {
        self.recording
            .lock()
            .map(|r| r.system_prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmGateway for ScriptedLlmGateway {
    async fn start(
        &self,
        system_prompt: &str,
        tools: &[serde_json::Value],
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        if let Ok(mut recording) = self.recording.lock() {
            recording.system_prompts.push(system_prompt.to_string());
            recording.declarations = tools.to_vec();
        }
        Ok(Box::new(ScriptedSession {
            steps: self.steps.clone(),
            cursor: AtomicUsize::new(0),
            recording: self.recording.clone(),
        }))
    }
}

struct ScriptedSession {
    steps: Arc<Vec<ScriptStep>>,
    cursor: AtomicUsize,
    recording: Arc<Mutex<Recording>>,
}

#[async_trait]
impl LlmSession for ScriptedSession {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn send(&self, message: &Message) -> Result<ModelResponse, GatewayError> {
        if let Ok(mut recording) = self.recording.lock() {
            recording.messages.push(message.clone());
        }

        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let Some(step) = self.steps.get(index) else {
            debug!(step = index, "Script exhausted");
            return Err(GatewayError::TransportClosed);
        };

        if step.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
        }
        debug!(step = index, "Replaying scripted response");
        step.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCRIPT: &str = r#"[
        {"calls": [{"name": "getAvailableMargin"}, {"name": "getQuote", "arguments": {"symbol": "BTCUSD"}}]},
        {"text": "Balance OK.", "delay_ms": 100},
        {"error": "upstream reset"}
    ]"#;

    #[test]
    fn test_parse_script() {
        let gateway = ScriptedLlmGateway::from_json(SCRIPT).unwrap();
        assert_eq!(gateway.len(), 3);
        assert_eq!(gateway.steps[1].delay_ms, 100);
        assert!(ScriptedLlmGateway::from_json(r#"[{"unknown": 1}]"#).is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = ScriptedLlmGateway::from_file("/nonexistent/script.json")
            .err()
            .unwrap();
        assert!(matches!(err, ScriptError::Io { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_in_order() {
        let gateway = ScriptedLlmGateway::from_json(SCRIPT).unwrap();
        let session = gateway.start("system", &[json!({"name": "getQuote"})]).await.unwrap();

        match session.send(&Message::task("Check")).await.unwrap() {
            ModelResponse::Calls { invocations } => {
                assert_eq!(invocations.len(), 2);
                assert_eq!(invocations[0].tool_name, "getAvailableMargin");
                assert!(invocations[0].arguments.is_empty());
                assert_eq!(invocations[1].get_string("symbol"), Some("BTCUSD"));
            }
            other => panic!("expected calls, got {:?}", other),
        }

        let start = tokio::time::Instant::now();
        let reply = session.send(&Message::Outcomes(vec![])).await.unwrap();
        assert_eq!(reply, ModelResponse::text("Balance OK."));
        assert!(start.elapsed() >= Duration::from_millis(100));

        let err = session.send(&Message::Outcomes(vec![])).await.unwrap_err();
        assert!(matches!(err, GatewayError::RequestFailed(ref m) if m == "upstream reset"));

        let err = session.send(&Message::Outcomes(vec![])).await.unwrap_err();
        assert!(matches!(err, GatewayError::TransportClosed));

        assert_eq!(gateway.received_messages().len(), 4);
        assert_eq!(gateway.received_messages()[0], Message::task("Check"));
        assert_eq!(gateway.system_prompts(), vec!["system".to_string()]);
        assert_eq!(gateway.declarations().len(), 1);
    }

    #[tokio::test]
    async fn test_each_session_restarts_script() {
        let gateway = ScriptedLlmGateway::new(vec![ScriptStep::text("first")]);
        for _ in 0..2 {
            let session = gateway.start("", &[]).await.unwrap();
            let reply = session.send(&Message::task("go")).await.unwrap();
            assert_eq!(reply, ModelResponse::text("first"));
        }
    }

    #[test]
    fn test_calls_step_builder() {
        let step = ScriptStep::calls(vec![ToolCall::new("placeOrder").with_arg("size", 2)]);
        match step.resolve().unwrap() {
            ModelResponse::Calls { invocations } => {
                assert_eq!(invocations[0].get_f64("size"), Some(2.0));
            }
            other => panic!("expected calls, got {:?}", other),
        }
    }
}
