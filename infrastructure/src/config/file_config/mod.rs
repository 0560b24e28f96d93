//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Enum-like values are kept as strings and parsed leniently so a typo
//! becomes a warning instead of a load failure.

mod conversation;
mod logging;
mod model;
mod prompt;
mod tools;

pub use conversation::FileConversationConfig;
pub use logging::FileLoggingConfig;
pub use model::{DEFAULT_API_KEY_ENV, DEFAULT_GEMINI_MODEL, FileModelConfig, ModelProvider};
pub use prompt::{DEFAULT_SYSTEM_PROMPT, FilePromptConfig};
pub use tools::{
    FileCommandToolConfig, FileHttpToolConfig, FileToolParameter, FileToolsConfig, HttpMethod,
};

use relay_domain::{ConfigIssue, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration that cannot be used at all
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("could not read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Conversation driver switches
    pub conversation: FileConversationConfig,
    /// Gateway selection
    pub model: FileModelConfig,
    /// System prompt
    pub prompt: FilePromptConfig,
    /// Command and HTTP tools
    pub tools: FileToolsConfig,
    /// Transcript logging
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Driver-level checks that need the final tool set (completion tool
    /// collisions, timeout relations) run again in the driver itself.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.conversation.to_conversation_config().1);
        issues.extend(self.model.validate());
        issues.extend(self.tools.validate());
        issues
    }

    /// Validate and fail on errors; warnings are returned for the caller
    /// to report.
    pub fn check(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let issues = self.validate();
        if ConfigIssue::has_errors(&issues) {
            let message = issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ConfigValidationError::Invalid(message));
        }
        Ok(issues)
    }

    /// Resolve the system prompt from `[prompt]`.
    pub fn system_prompt(&self) -> Result<String, ConfigValidationError> {
        self.prompt
            .resolve_system_prompt()
            .map_err(|source| ConfigValidationError::Unreadable {
                path: self.prompt.system_file.clone().unwrap_or_default(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::ExitMode;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[conversation]
exit_mode = "explicit-tool"
turn_delay_ms = 1000
master_timeout_ms = 60000

[model]
name = "gemini-1.5-pro"
temperature = 0.1

[prompt]
system = "You manage a trading account."

[tools.command.getPositions]
description = "Open positions"
command = "venue-cli positions"

[logging]
conversation_log = "run.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let (conversation, issues) = config.conversation.to_conversation_config();
        assert!(issues.is_empty());
        assert_eq!(conversation.exit_mode, ExitMode::ExplicitTool);
        assert_eq!(conversation.turn_delay_ms, 1000);
        assert_eq!(config.model.name, "gemini-1.5-pro");
        assert_eq!(config.model.temperature, Some(0.1));
        assert_eq!(config.system_prompt().unwrap(), "You manage a trading account.");
        assert_eq!(config.tools.command.len(), 1);
        assert_eq!(config.logging.conversation_log.as_deref(), Some("run.jsonl"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[conversation]\nmax_turns = 3\n").unwrap();
        assert_eq!(config.conversation.max_turns, Some(3));
        assert_eq!(config.model, FileModelConfig::default());
        assert!(config.tools.is_empty());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert!(config.check().unwrap().is_empty());
    }

    #[test]
    fn test_check_fails_on_errors_keeps_warnings() {
        let mut config = FileConfig::default();
        config.conversation.calls_per_turn = "several".to_string();
        let warnings = config.check().unwrap();
        assert_eq!(warnings.len(), 1);

        config.model.request_timeout_secs = 0;
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }
}
