//! Infrastructure layer for agent-relay
//!
//! Adapters implementing the application ports: model gateways, the tool
//! registry with its configured handlers, the JSONL transcript logger,
//! and configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod tools;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig, ModelProvider};
pub use logging::JsonlConversationLogger;
pub use providers::{
    GeminiConfig, GeminiLlmGateway, ScriptError, ScriptStep, ScriptedLlmGateway,
};
pub use tools::{
    CommandToolHandler, HttpToolHandler, JsonSchemaToolConverter, RegistryError, ToolRegistry,
    registry_from_config,
};
