//! Progress notification port
//!
//! Defines the interface for reporting what the conversation driver is
//! doing. Implementations live in the presentation layer.

use relay_domain::{ConversationPhase, ModelResponse, TerminationReason, ToolCall, ToolOutcome};

/// Callback for progress updates during a conversation.
///
/// Every method has a no-op default so implementations only override
/// the events they display.
pub trait ConversationProgressNotifier: Send + Sync {
    /// The driver entered a new phase of `turn`.
    fn on_phase(&self, _phase: ConversationPhase, _turn: usize) {}

    /// The model answered.
    fn on_model_response(&self, _turn: usize, _response: &ModelResponse) {}

    /// A tool call is about to be dispatched.
    fn on_tool_call(&self, _call: &ToolCall) {}

    /// A tool call settled (or was rejected).
    fn on_tool_result(&self, _outcome: &ToolOutcome) {}

    /// The conversation ended.
    fn on_terminated(&self, _reason: &TerminationReason) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoConversationProgress;

impl ConversationProgressNotifier for NoConversationProgress {}
