//! Tool registry and configured tool handlers
//!
//! - [`ToolRegistry`]: name → (definition, handler), implements
//!   `ToolExecutorPort`
//! - [`JsonSchemaToolConverter`]: declaration JSON for the model
//! - [`CommandToolHandler`]: `[tools.command.<name>]`
//! - [`HttpToolHandler`]: `[tools.http.<name>]`
//!
//! Embedders register their own handlers (any `ToolHandler`) next to the
//! configured ones.

pub mod command;
pub mod http;
mod registry;
mod schema;

pub use command::CommandToolHandler;
pub use http::HttpToolHandler;
pub use registry::{RegistryError, ToolRegistry};
pub use schema::JsonSchemaToolConverter;

use crate::config::FileToolsConfig;
use relay_domain::ConfigIssue;
use std::sync::Arc;
use std::time::Duration;

/// Timeout of the shared HTTP client used by HTTP tools
const HTTP_TOOL_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Build a registry holding every tool declared in `[tools]`.
///
/// Command tools are registered before HTTP tools; within a kind tools are
/// sorted by name. Configuration errors (empty command, bad URL) fail the
/// build; warnings are dropped here and reported by `FileConfig::validate`.
pub fn registry_from_config(config: &FileToolsConfig) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();

    for (name, tool) in &config.command {
        let (definition, issues) = tool.to_definition(name);
        reject_errors(name, &issues)?;
        let handler = CommandToolHandler::from_config(&definition, tool);
        registry.register(definition, Arc::new(handler))?;
    }

    if !config.http.is_empty() {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TOOL_CLIENT_TIMEOUT)
            .build()
            .map_err(|e| RegistryError::InvalidTool {
                name: "http".to_string(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        for (name, tool) in &config.http {
            let (definition, issues) = tool.to_definition(name);
            reject_errors(name, &issues)?;
            let handler = HttpToolHandler::from_config(client.clone(), &definition, tool);
            registry.register(definition, Arc::new(handler))?;
        }
    }

    Ok(registry)
}

fn reject_errors(name: &str, issues: &[ConfigIssue]) -> Result<(), RegistryError> {
    if let Some(issue) = issues
        .iter()
        .find(|i| i.severity == relay_domain::Severity::Error)
    {
        return Err(RegistryError::InvalidTool {
            name: name.to_string(),
            reason: issue.message.clone(),
        });
    }
    Ok(())
}
