//! Tool schema conversion port.
//!
//! Separates "which tools exist" (domain) from "how to describe them to a
//! model API" (infrastructure).

use relay_domain::tool::entities::{ToolDefinition, ToolSpec};

/// Port for converting tool definitions into declaration JSON.
pub trait ToolSchemaPort: Send + Sync {
    /// Convert a single tool definition.
    fn tool_to_schema(&self, tool: &ToolDefinition) -> serde_json::Value;

    /// Convert every tool in the spec, preserving registration order.
    fn all_tools_schema(&self, spec: &ToolSpec) -> Vec<serde_json::Value> {
        spec.all().map(|t| self.tool_to_schema(t)).collect()
    }
}
