//! Tool Registry
//!
//! The [`ToolRegistry`] pairs every [`ToolDefinition`] with the handler that
//! executes it and implements [`ToolExecutorPort`] for the driver.
//!
//! # Usage
//!
//! ```ignore
//! use relay_infrastructure::tools::ToolRegistry;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(
//!     ToolDefinition::new("getAvailableMargin", "Available margin in USD"),
//!     Arc::new(FnToolHandler::new(|_call: ToolCall| async move {
//!         Ok(serde_json::json!({ "usd": 12500.0 }))
//!     })),
//! )?;
//!
//! let call = ToolCall::new("getAvailableMargin");
//! let value = registry.dispatch(&call).await?;
//! ```
//!
//! Arguments are forwarded to handlers unchecked. The parameter schema is
//! advisory metadata for the model; handlers validate what they receive.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use relay_application::ports::{tool_executor::ToolExecutorPort, tool_handler::ToolHandler};
use relay_domain::DomainError;
use relay_domain::tool::{
    entities::{ToolCall, ToolDefinition, ToolSpec},
    value_objects::ToolError,
};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while assembling a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid tool '{name}': {reason}")]
    InvalidTool { name: String, reason: String },
}

impl From<DomainError> for RegistryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::DuplicateTool(name) => RegistryError::DuplicateTool(name),
            other => RegistryError::InvalidTool {
                name: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// Name → (definition, handler) table
#[derive(Default)]
pub struct ToolRegistry {
    /// Definitions in registration order
    tool_spec: ToolSpec,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(
        &mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if definition.name.trim().is_empty() {
            return Err(RegistryError::InvalidTool {
                name: definition.name,
                reason: "name cannot be empty".to_string(),
            });
        }

        let name = definition.name.clone();
        self.tool_spec.register(definition)?;
        self.handlers.insert(name.clone(), handler);
        debug!(tool = %name, "Registered tool");
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_tool(
        mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<Self, RegistryError> {
        self.register(definition, handler)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.tool_spec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tool_spec.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_spec.names().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn tool_spec(&self) -> &ToolSpec {
        &self.tool_spec
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        let Some(handler) = self.handlers.get(&call.tool_name) else {
            return Err(ToolError::unknown_tool(&call.tool_name));
        };

        trace!(tool = %call.tool_name, "Dispatching tool call");
        handler.call(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_application::ports::tool_handler::FnToolHandler;
    use relay_domain::ToolErrorKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_handler() -> Arc<dyn ToolHandler> {
        Arc::new(FnToolHandler::new(|call: ToolCall| async move {
            Ok(call.arguments_json())
        }))
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::new("getQuote", "first"), echo_handler())
            .unwrap();

        let err = registry
            .register(ToolDefinition::new("getQuote", "second"), echo_handler())
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("getQuote".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_tool("getQuote").unwrap().description, "first");
    }

    #[test]
    fn test_register_rejects_empty_name() {
        let err = ToolRegistry::new()
            .with_tool(ToolDefinition::new(" ", ""), echo_handler())
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTool { .. }));
    }

    #[test]
    fn test_available_tools_in_registration_order() {
        let registry = ToolRegistry::new()
            .with_tool(ToolDefinition::new("zeta", ""), echo_handler())
            .unwrap()
            .with_tool(ToolDefinition::new("alpha", ""), echo_handler())
            .unwrap();

        assert_eq!(registry.available_tools(), vec!["zeta", "alpha"]);
        assert!(registry.has_tool("alpha"));
        assert!(!registry.has_tool("beta"));
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let registry = ToolRegistry::new()
            .with_tool(
                ToolDefinition::new("getAvailableMargin", ""),
                Arc::new(FnToolHandler::new(move |_call: ToolCall| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(json!({"usd": 12500.0}))
                    }
                })),
            )
            .unwrap()
            .with_tool(ToolDefinition::new("echo", ""), echo_handler())
            .unwrap();

        let value = registry
            .dispatch(&ToolCall::new("getAvailableMargin"))
            .await
            .unwrap();
        assert_eq!(value, json!({"usd": 12500.0}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let value = registry
            .dispatch(&ToolCall::new("echo").with_arg("symbol", "BTCUSD"))
            .await
            .unwrap();
        assert_eq!(value, json!({"symbol": "BTCUSD"}));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.dispatch(&ToolCall::new("nope")).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::UnknownTool);
        assert!(err.message.contains("nope"));
    }

    #[tokio::test]
    async fn test_dispatch_propagates_handler_failure() {
        let registry = ToolRegistry::new()
            .with_tool(
                ToolDefinition::new("broken", ""),
                Arc::new(FnToolHandler::new(|_call: ToolCall| async move {
                    Err(ToolError::execution_failed("venue offline"))
                })),
            )
            .unwrap();

        let err = registry.dispatch(&ToolCall::new("broken")).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::ExecutionFailed);
        assert_eq!(err.message, "venue offline");
    }
}
