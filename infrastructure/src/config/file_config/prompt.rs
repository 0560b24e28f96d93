//! Prompt configuration from TOML (`[prompt]` section)

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an autonomous agent. Use the available tools to \
complete the task. Call tools whenever you need information or need to act; when the task is \
complete, reply with a short final answer.";

/// Raw prompt configuration from TOML
///
/// ```toml
/// [prompt]
/// system = "You manage a trading account..."
/// # or
/// system_file = "prompts/trader.md"
/// ```
///
/// `system_file` wins over `system` when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePromptConfig {
    pub system: Option<String>,
    pub system_file: Option<String>,
}

impl FilePromptConfig {
    /// Resolve the system prompt, reading `system_file` if set.
    pub fn resolve_system_prompt(&self) -> std::io::Result<String> {
        if let Some(path) = &self.system_file {
            return std::fs::read_to_string(Path::new(path)).map(|s| s.trim().to_string());
        }
        Ok(self
            .system
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()))
    }
}
