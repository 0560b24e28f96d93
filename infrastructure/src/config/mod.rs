//! Configuration file loading for agent-relay
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `AGENT_RELAY_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./relay.toml` or `./.relay.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/agent-relay/config.toml`
//! 5. Default values
//!
//! Command-line flags are applied on top by the binary.

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_API_KEY_ENV, DEFAULT_GEMINI_MODEL, DEFAULT_SYSTEM_PROMPT,
    FileCommandToolConfig, FileConfig, FileConversationConfig, FileHttpToolConfig,
    FileLoggingConfig, FileModelConfig, FilePromptConfig, FileToolParameter, FileToolsConfig,
    HttpMethod, ModelProvider,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
