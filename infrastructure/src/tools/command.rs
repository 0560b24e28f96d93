//! Command tool handler: user-defined shell commands as tools.
//!
//! Each `[tools.command.<name>]` entry wraps a shell command template with
//! `{param_name}` placeholders. Standard output is parsed as JSON when
//! possible and returned as a plain string otherwise.
//!
//! # Security
//!
//! All parameter values are shell-escaped before substitution to prevent
//! command injection: single-quote wrapping on Unix, double-quote wrapping
//! with character escaping on Windows.
//!
//! # Exit codes
//!
//! - `0` → success
//! - the configured `fatal_exit_code` (default `3`) → fatal failure
//! - anything else → recoverable `ExecutionFailed`

use async_trait::async_trait;
use relay_application::ports::tool_handler::ToolHandler;
use relay_domain::tool::{
    entities::{ToolCall, ToolDefinition},
    value_objects::ToolError,
};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::FileCommandToolConfig;

/// Exit code that marks a failure as unrecoverable unless configured otherwise
pub const DEFAULT_FATAL_EXIT_CODE: i32 = 3;

/// Maximum output size kept from stdout/stderr (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Handler running a command template through the platform shell
#[derive(Debug, Clone)]
pub struct CommandToolHandler {
    tool_name: String,
    command_template: String,
    required: Vec<String>,
    working_dir: Option<PathBuf>,
    fatal_exit_code: i32,
}

impl CommandToolHandler {
    pub fn new(definition: &ToolDefinition, command_template: impl Into<String>) -> Self {
        Self {
            tool_name: definition.name.clone(),
            command_template: command_template.into(),
            required: definition
                .required_parameters()
                .map(str::to_string)
                .collect(),
            working_dir: None,
            fatal_exit_code: DEFAULT_FATAL_EXIT_CODE,
        }
    }

    pub fn from_config(definition: &ToolDefinition, config: &FileCommandToolConfig) -> Self {
        let mut handler = Self::new(definition, config.command.as_str());
        if let Some(dir) = &config.working_dir {
            handler = handler.with_working_dir(dir);
        }
        if let Some(code) = config.fatal_exit_code {
            handler = handler.with_fatal_exit_code(code);
        }
        handler
    }

    /// Set the working directory for command execution.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_fatal_exit_code(mut self, code: i32) -> Self {
        self.fatal_exit_code = code;
        self
    }

    /// Build the final command string by substituting parameters.
    ///
    /// `{param_name}` placeholders are replaced with shell-escaped argument
    /// values. Placeholders without a value are removed; braces that do not
    /// enclose an identifier are kept as written.
    fn build_command(&self, call: &ToolCall) -> String {
        let mut result = String::with_capacity(self.command_template.len());
        let mut chars = self.command_template.chars();

        while let Some(ch) = chars.next() {
            if ch != '{' {
                result.push(ch);
                continue;
            }

            let mut placeholder = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                placeholder.push(c);
            }

            let is_identifier = !placeholder.is_empty()
                && placeholder.chars().all(|c| c.is_alphanumeric() || c == '_');
            if !closed {
                result.push('{');
                result.push_str(&placeholder);
            } else if !is_identifier {
                result.push('{');
                result.push_str(&placeholder);
                result.push('}');
            } else if let Some(value) = call.arguments.get(&placeholder) {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                result.push_str(&shell_escape(&value));
            }
        }

        result
    }

    fn shell_command(&self, command_str: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command_str]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command_str]);
            c
        };

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl ToolHandler for CommandToolHandler {
    async fn call(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        if let Some(missing) = self
            .required
            .iter()
            .find(|name| !call.arguments.contains_key(name.as_str()))
        {
            return Err(ToolError::invalid_argument(format!(
                "Missing required argument: {}",
                missing
            )));
        }

        let command_str = self.build_command(call);
        debug!(tool = %self.tool_name, command = %command_str, "Running command tool");

        let output = self
            .shell_command(&command_str)
            .output()
            .await
            .map_err(|e| {
                ToolError::execution_failed(format!("Failed to execute command: {}", e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = truncate(stdout.trim(), MAX_OUTPUT_SIZE);

        if output.status.success() {
            return Ok(serde_json::from_str(stdout)
                .unwrap_or_else(|_| serde_json::Value::String(stdout.to_string())));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = truncate(stderr.trim(), MAX_OUTPUT_SIZE);
        let detail = if !stderr.is_empty() { stderr } else { stdout };
        let message = match output.status.code() {
            Some(code) if detail.is_empty() => format!("Command exited with code {}", code),
            Some(code) => format!("Command exited with code {}: {}", code, detail),
            None => "Command terminated by signal".to_string(),
        };

        let error = ToolError::execution_failed(message);
        if output.status.code() == Some(self.fatal_exit_code) {
            Err(error.into_fatal())
        } else {
            Err(error)
        }
    }
}

/// Cut `s` to at most `max` bytes on a character boundary.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Escape a string for safe shell substitution.
///
/// Uses OS-appropriate escaping:
/// - **Unix**: Single-quote wrapping (`hello 'world'` → `'hello '\''world'\'''`)
/// - **Windows**: Double-quote wrapping with `"` → `\"`, `%` → `%%`, `!` → `^!`
fn shell_escape(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '/')
    {
        return s.to_string();
    }

    if cfg!(target_os = "windows") {
        shell_escape_windows(s)
    } else {
        shell_escape_unix(s)
    }
}

fn shell_escape_unix(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 4);
    escaped.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

fn shell_escape_windows(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 4);
    escaped.push('"');
    for ch in s.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '%' => escaped.push_str("%%"),
            '!' => escaped.push_str("^!"),
            _ => escaped.push(ch),
        }
    }
    escaped.push('"');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::{ToolErrorKind, ToolParameter};
    use serde_json::json;

    fn handler(template: &str) -> CommandToolHandler {
        let definition = ToolDefinition::new("t", "")
            .with_parameter(ToolParameter::new("symbol", "", true))
            .with_parameter(ToolParameter::new("note", "", false));
        CommandToolHandler::new(&definition, template)
    }

    #[test]
    fn test_shell_escape_unix() {
        assert_eq!(shell_escape_unix("hello world"), "'hello world'");
        assert_eq!(shell_escape_unix("it's"), "'it'\\''s'");
        assert_eq!(shell_escape("BTCUSD"), "BTCUSD");
        assert_eq!(shell_escape_windows("100%"), "\"100%%\"");
    }

    #[test]
    fn test_build_command_substitutes_and_escapes() {
        let h = handler("venue-cli quote {symbol} --note {note} --literal {not a placeholder}");
        let call = ToolCall::new("t").with_arg("symbol", "BTC USD; rm -rf /");
        let built = h.build_command(&call);

        if cfg!(target_os = "windows") {
            assert!(built.contains("\"BTC USD; rm -rf /\""));
        } else {
            assert!(built.starts_with("venue-cli quote 'BTC USD; rm -rf /' --note "));
        }
        assert!(built.ends_with("--literal {not a placeholder}"));
    }

    #[test]
    fn test_build_command_non_string_argument() {
        let h = handler("venue-cli order --size {size}");
        let call = ToolCall::new("t").with_arg("size", 2);
        assert_eq!(h.build_command(&call), "venue-cli order --size 2");
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let err = handler("echo {symbol}")
            .call(&ToolCall::new("t"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArgument);
        assert!(err.message.contains("symbol"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_json_stdout_is_parsed() {
        let value = handler(r#"printf '{"symbol": "%s", "bid": 101.5}' {symbol}"#)
            .call(&ToolCall::new("t").with_arg("symbol", "BTCUSD"))
            .await
            .unwrap();
        assert_eq!(value, json!({"symbol": "BTCUSD", "bid": 101.5}));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_plain_stdout_is_a_string() {
        let value = handler("echo margin ok for {symbol}")
            .call(&ToolCall::new("t").with_arg("symbol", "ETHUSD"))
            .await
            .unwrap();
        assert_eq!(value, json!("margin ok for ETHUSD"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_recoverable() {
        let err = handler("echo venue offline >&2; exit 1 # {symbol}")
            .call(&ToolCall::new("t").with_arg("symbol", "X"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::ExecutionFailed);
        assert!(!err.is_fatal());
        assert_eq!(err.message, "Command exited with code 1: venue offline");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fatal_exit_code() {
        let err = handler("exit 3 # {symbol}")
            .call(&ToolCall::new("t").with_arg("symbol", "X"))
            .await
            .unwrap_err();
        assert!(err.is_fatal());

        let err = handler("exit 3 # {symbol}")
            .with_fatal_exit_code(42)
            .call(&ToolCall::new("t").with_arg("symbol", "X"))
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let value = handler("cat marker.txt # {symbol}")
            .with_working_dir(dir.path())
            .call(&ToolCall::new("t").with_arg("symbol", "X"))
            .await
            .unwrap();
        assert_eq!(value, json!("here"));
    }
}
