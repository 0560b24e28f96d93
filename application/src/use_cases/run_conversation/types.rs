//! Type definitions for the RunConversation use case.

use relay_domain::{ConversationConfig, ConversationState, TerminationReason};
use thiserror::Error;

/// Fatal ways a conversation can end, plus invalid configuration.
///
/// Recoverable tool failures never show up here: they are fed back to
/// the model as outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunConversationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Gateway transport failure: {0}")]
    GatewayTransportFailure(String),

    #[error("Master timeout exceeded after {limit_ms}ms")]
    MasterTimeoutExceeded { limit_ms: u64 },

    #[error("Tool '{tool}' failed fatally: {message}")]
    FatalToolError { tool: String, message: String },

    #[error("Max turns exceeded ({0})")]
    MaxTurnsExceeded(usize),

    #[error("Operation cancelled")]
    Cancelled,
}

impl RunConversationError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunConversationError::Cancelled)
    }

    /// Map a fatal termination to its error. `None` for success reasons.
    pub fn from_termination(reason: &TerminationReason) -> Option<Self> {
        match reason {
            TerminationReason::NoFurtherCalls { .. }
            | TerminationReason::ExplicitCompletion { .. } => None,
            TerminationReason::MasterTimeoutExceeded { limit_ms } => {
                Some(RunConversationError::MasterTimeoutExceeded {
                    limit_ms: *limit_ms,
                })
            }
            TerminationReason::FatalToolError { tool, message } => {
                Some(RunConversationError::FatalToolError {
                    tool: tool.clone(),
                    message: message.clone(),
                })
            }
            TerminationReason::GatewayTransportFailure { message } => Some(
                RunConversationError::GatewayTransportFailure(message.clone()),
            ),
            TerminationReason::MaxTurnsExceeded { limit } => {
                Some(RunConversationError::MaxTurnsExceeded(*limit))
            }
            TerminationReason::Cancelled => Some(RunConversationError::Cancelled),
        }
    }
}

/// Input for the RunConversation use case
#[derive(Debug, Clone)]
pub struct RunConversationInput {
    /// The task prompt sent on the first turn
    pub task: String,
    /// System instruction for the session
    pub system_prompt: String,
    /// Driver switches
    pub config: ConversationConfig,
}

impl RunConversationInput {
    pub fn new(task: impl Into<String>, config: ConversationConfig) -> Self {
        Self {
            task: task.into(),
            system_prompt: String::new(),
            config,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }
}

/// Output from the RunConversation use case.
///
/// Produced for every run that got past configuration validation,
/// whether it ended well or not.
#[derive(Debug, Clone)]
pub struct RunConversationOutput {
    /// Final state: completed turns plus the termination reason
    pub state: ConversationState,
}

impl RunConversationOutput {
    pub fn termination(&self) -> Option<&TerminationReason> {
        self.state.termination()
    }

    pub fn is_success(&self) -> bool {
        self.termination().is_some_and(|r| r.is_success())
    }

    /// Text or summary the model ended with
    pub fn final_text(&self) -> Option<&str> {
        self.termination().and_then(|r| r.final_text())
    }

    /// Convert fatal terminations into errors for callers using `?`.
    pub fn into_result(self) -> Result<Self, RunConversationError> {
        match self.termination().and_then(RunConversationError::from_termination) {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}
