//! LLM Gateway port
//!
//! Defines the interface for communicating with the model. The gateway
//! opens a session; the session keeps the full conversation history so
//! the driver only ever sends the newest message.

use async_trait::async_trait;
use relay_domain::{Message, ModelResponse};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations.
///
/// All of them are fatal to a conversation: the core never retries a
/// gateway call.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport closed")]
    TransportClosed,
}

/// Gateway for LLM communication
///
/// This port defines how the application layer reaches the model.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Open a session with a system prompt and the tool declarations.
    ///
    /// `tools` is the declaration surface produced by a
    /// [`ToolSchemaPort`](super::tool_schema::ToolSchemaPort), in order.
    /// Fails if the initial exchange cannot be established.
    async fn start(
        &self,
        system_prompt: &str,
        tools: &[serde_json::Value],
    ) -> Result<Box<dyn LlmSession>, GatewayError>;
}

/// An active LLM session (the conversation handle)
#[async_trait]
pub trait LlmSession: Send + Sync {
    /// Model identifier used by this session
    fn model(&self) -> &str;

    /// Send a message and get the model's response.
    ///
    /// The session appends both the message and the response to its own
    /// history before returning.
    async fn send(&self, message: &Message) -> Result<ModelResponse, GatewayError>;
}
