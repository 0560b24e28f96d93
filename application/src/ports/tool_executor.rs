//! Tool Executor port
//!
//! Defines how the driver dispatches tool calls. The infrastructure
//! `ToolRegistry` is the production implementation.

use async_trait::async_trait;
use relay_domain::tool::{
    entities::{ToolCall, ToolDefinition, ToolSpec},
    value_objects::ToolError,
};

/// Port for tool dispatch
///
/// Dispatch performs no validation of arguments against the declared
/// schema; handlers receive whatever the model sent.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Get the specification of all available tools
    fn tool_spec(&self) -> &ToolSpec;

    /// Check if a tool is available
    fn has_tool(&self, name: &str) -> bool {
        self.tool_spec().contains(name)
    }

    /// Get the definition of a specific tool
    fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tool_spec().get(name)
    }

    /// Get names of all available tools, in registration order
    fn available_tools(&self) -> Vec<&str> {
        self.tool_spec().names().collect()
    }

    /// Invoke the handler registered for `call.tool_name`.
    ///
    /// Fails with an `UnknownTool` error if no handler is registered;
    /// otherwise returns the handler's payload or propagates its failure.
    async fn dispatch(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError>;
}
