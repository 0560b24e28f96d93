//! Why a conversation ended.

use serde::{Deserialize, Serialize};

/// Terminal state of a conversation. Exactly one is recorded per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TerminationReason {
    /// The model answered with text and requested no tools
    NoFurtherCalls { text: String },
    /// The model called the completion tool
    ExplicitCompletion { summary: String },
    /// The whole conversation outlived its deadline
    MasterTimeoutExceeded { limit_ms: u64 },
    /// A handler raised an unrecoverable failure and the policy is to halt
    FatalToolError { tool: String, message: String },
    /// The model could not be reached
    GatewayTransportFailure { message: String },
    /// The configured turn bound was hit
    MaxTurnsExceeded { limit: usize },
    /// Cancelled from outside
    Cancelled,
}

impl TerminationReason {
    /// The model ended the conversation on its own terms.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TerminationReason::NoFurtherCalls { .. } | TerminationReason::ExplicitCompletion { .. }
        )
    }

    /// Final text surfaced to the caller, if the model produced one
    pub fn final_text(&self) -> Option<&str> {
        match self {
            TerminationReason::NoFurtherCalls { text } => Some(text),
            TerminationReason::ExplicitCompletion { summary } => Some(summary),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TerminationReason::NoFurtherCalls { .. } => "no_further_calls",
            TerminationReason::ExplicitCompletion { .. } => "explicit_completion",
            TerminationReason::MasterTimeoutExceeded { .. } => "master_timeout_exceeded",
            TerminationReason::FatalToolError { .. } => "fatal_tool_error",
            TerminationReason::GatewayTransportFailure { .. } => "gateway_transport_failure",
            TerminationReason::MaxTurnsExceeded { .. } => "max_turns_exceeded",
            TerminationReason::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::NoFurtherCalls { .. } => write!(f, "model finished without further calls"),
            TerminationReason::ExplicitCompletion { .. } => write!(f, "model called the completion tool"),
            TerminationReason::MasterTimeoutExceeded { limit_ms } => {
                write!(f, "conversation exceeded its {}ms deadline", limit_ms)
            }
            TerminationReason::FatalToolError { tool, message } => {
                write!(f, "tool '{}' failed fatally: {}", tool, message)
            }
            TerminationReason::GatewayTransportFailure { message } => {
                write!(f, "model gateway failed: {}", message)
            }
            TerminationReason::MaxTurnsExceeded { limit } => {
                write!(f, "turn limit of {} reached", limit)
            }
            TerminationReason::Cancelled => write!(f, "conversation cancelled"),
        }
    }
}
