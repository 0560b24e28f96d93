//! Tool domain module
//!
//! Defines what the model may call and what comes back:
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ ToolCall     │───▶│ ToolOutcome  │
//! │ (registry)   │    │ (invocation) │    │ (result)     │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! - [`ToolDefinition`]: name, description and parameter schema of one tool
//! - [`ToolSpec`]: ordered set of definitions with unique names
//! - [`ToolCall`]: an invocation requested by the model
//! - [`ToolOutcome`]: payload or [`ToolError`] for one invocation
//!
//! The parameter schema is advisory: it is advertised to the model but
//! never enforced before a handler runs. Handlers validate what they read.
//!
//! Execution (handlers, the registry, timeouts) lives outside the domain;
//! see the application layer's `ToolExecutorPort`.

pub mod entities;
pub mod value_objects;

pub use entities::{ParamType, ToolCall, ToolDefinition, ToolParameter, ToolSpec};
pub use value_objects::{OutcomeBody, ToolError, ToolErrorKind, ToolOutcome};
