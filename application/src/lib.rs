//! Application layer for agent-relay
//!
//! This crate contains the conversation driver and the ports it talks
//! through. It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    progress::{ConversationProgressNotifier, NoConversationProgress},
    tool_executor::ToolExecutorPort,
    tool_handler::{FnToolHandler, ToolHandler},
    tool_schema::ToolSchemaPort,
};
pub use use_cases::guard::ExecutionGuard;
pub use use_cases::run_conversation::{
    RunConversationError, RunConversationInput, RunConversationOutput, RunConversationUseCase,
};
pub use use_cases::throttle::TurnThrottle;
