//! Domain layer for agent-relay
//!
//! This crate contains the data model of a tool-calling conversation
//! between a language model and a set of external tools. It has no
//! dependencies on async runtimes, transports or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A [`ToolDefinition`] describes a capability the model may request.
//! The model asks for it with a [`ToolCall`]; every executed call yields a
//! [`ToolOutcome`] carrying either a payload or a [`ToolError`].
//!
//! ## Turns
//!
//! A turn is one round trip with the model plus the tool executions it
//! triggers. The driver sends a [`Message`] (the task, then outcome
//! batches) and receives a [`ModelResponse`] (text or calls).
//!
//! ## Termination
//!
//! Every conversation ends with exactly one [`TerminationReason`],
//! recorded in the driver-owned [`ConversationState`].

pub mod conversation;
pub mod core;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use conversation::{
    CallsPerTurn, ConfigIssue, ConfigIssueCode, ConversationConfig, ConversationPhase,
    ConversationState, Exchange, ExitMode, FatalToolPolicy, Severity, TerminationReason,
    TurnRecord, UnknownToolPolicy,
};
pub use core::error::DomainError;
pub use session::{
    message::Message,
    response::{ContentBlock, ModelResponse},
};
pub use tool::{
    entities::{ParamType, ToolCall, ToolDefinition, ToolParameter, ToolSpec},
    value_objects::{OutcomeBody, ToolError, ToolErrorKind, ToolOutcome},
};
