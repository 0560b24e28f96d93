//! Conversation driver configuration.
//!
//! The turn policies are orthogonal switches on a single driver rather
//! than separate implementations:
//!
//! | Switch | Values | Default |
//! |--------|--------|---------|
//! | `calls_per_turn` | `first`, `all` | `all` |
//! | `exit_mode` | `implicit`, `explicit-tool` | `implicit` |
//! | `unknown_tool_policy` | `report`, `skip` | `report` |
//! | `fatal_tool_policy` | `halt`, `report` | `halt` |
//! | `turn_delay_ms` / `call_delay_ms` | fixed sleeps | 0 |
//! | `per_call_timeout_ms` / `master_timeout_ms` | deadlines | none |
//! | `max_turns` | turn bound | none |

use super::validation::{ConfigIssue, ConfigIssueCode};
use crate::tool::entities::{ToolDefinition, ToolParameter, ToolSpec};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many of the invocations in one model response are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallsPerTurn {
    /// Only the first invocation; the rest are dropped. One round trip per tool.
    First,
    /// Every invocation, batched into a single reply.
    #[default]
    All,
}

impl CallsPerTurn {
    pub fn as_str(&self) -> &str {
        match self {
            CallsPerTurn::First => "first",
            CallsPerTurn::All => "all",
        }
    }
}

impl std::fmt::Display for CallsPerTurn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CallsPerTurn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" | "single" | "one" => Ok(CallsPerTurn::First),
            "all" => Ok(CallsPerTurn::All),
            other => Err(format!("unknown calls_per_turn: {}", other)),
        }
    }
}

/// How the model signals that it is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitMode {
    /// A text-only response ends the conversation.
    #[default]
    Implicit,
    /// A completion tool is declared; calling it ends the conversation.
    /// A text-only response still ends it too.
    ExplicitTool,
}

impl ExitMode {
    pub fn as_str(&self) -> &str {
        match self {
            ExitMode::Implicit => "implicit",
            ExitMode::ExplicitTool => "explicit-tool",
        }
    }
}

impl std::fmt::Display for ExitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "implicit" => Ok(ExitMode::Implicit),
            "explicit-tool" | "explicit_tool" | "explicit" => Ok(ExitMode::ExplicitTool),
            other => Err(format!("unknown exit_mode: {}", other)),
        }
    }
}

/// What to do with a call to a tool the registry does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownToolPolicy {
    /// Send an `UnknownTool` failure back so the model can correct itself.
    #[default]
    Report,
    /// Log and drop the call. The model receives no reply for it.
    Skip,
}

impl std::str::FromStr for UnknownToolPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report" => Ok(UnknownToolPolicy::Report),
            "skip" | "ignore" => Ok(UnknownToolPolicy::Skip),
            other => Err(format!("unknown unknown_tool_policy: {}", other)),
        }
    }
}

/// What to do when a handler flags its failure as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatalToolPolicy {
    /// Terminate the conversation with `FatalToolError`.
    #[default]
    Halt,
    /// Treat it like any other failure and report it to the model.
    Report,
}

impl std::str::FromStr for FatalToolPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "halt" | "stop" => Ok(FatalToolPolicy::Halt),
            "report" => Ok(FatalToolPolicy::Report),
            other => Err(format!("unknown fatal_tool_policy: {}", other)),
        }
    }
}

pub const DEFAULT_COMPLETION_TOOL: &str = "finish";
pub const DEFAULT_SUMMARY_FIELD: &str = "summary";

/// Driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub calls_per_turn: CallsPerTurn,
    pub exit_mode: ExitMode,
    /// Name of the completion tool (explicit-tool mode only)
    pub completion_tool: String,
    /// Argument of the completion tool surfaced as the final result
    pub summary_field: String,
    pub unknown_tool_policy: UnknownToolPolicy,
    pub fatal_tool_policy: FatalToolPolicy,
    /// Fixed delay before every send after the first
    pub turn_delay_ms: u64,
    /// Fixed delay between calls of the same turn; forces sequential execution
    pub call_delay_ms: u64,
    pub per_call_timeout_ms: Option<u64>,
    pub master_timeout_ms: Option<u64>,
    pub max_turns: Option<usize>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            calls_per_turn: CallsPerTurn::default(),
            exit_mode: ExitMode::default(),
            completion_tool: DEFAULT_COMPLETION_TOOL.to_string(),
            summary_field: DEFAULT_SUMMARY_FIELD.to_string(),
            unknown_tool_policy: UnknownToolPolicy::default(),
            fatal_tool_policy: FatalToolPolicy::default(),
            turn_delay_ms: 0,
            call_delay_ms: 0,
            per_call_timeout_ms: None,
            master_timeout_ms: None,
            max_turns: None,
        }
    }
}

impl ConversationConfig {
    pub fn with_calls_per_turn(mut self, calls_per_turn: CallsPerTurn) -> Self {
        self.calls_per_turn = calls_per_turn;
        self
    }

    pub fn with_explicit_completion(mut self, tool_name: impl Into<String>) -> Self {
        self.exit_mode = ExitMode::ExplicitTool;
        self.completion_tool = tool_name.into();
        self
    }

    pub fn with_unknown_tool_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.unknown_tool_policy = policy;
        self
    }

    pub fn with_fatal_tool_policy(mut self, policy: FatalToolPolicy) -> Self {
        self.fatal_tool_policy = policy;
        self
    }

    pub fn with_turn_delay_ms(mut self, ms: u64) -> Self {
        self.turn_delay_ms = ms;
        self
    }

    pub fn with_call_delay_ms(mut self, ms: u64) -> Self {
        self.call_delay_ms = ms;
        self
    }

    pub fn with_per_call_timeout_ms(mut self, ms: u64) -> Self {
        self.per_call_timeout_ms = Some(ms);
        self
    }

    pub fn with_master_timeout_ms(mut self, ms: u64) -> Self {
        self.master_timeout_ms = Some(ms);
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }

    pub fn call_delay(&self) -> Duration {
        Duration::from_millis(self.call_delay_ms)
    }

    pub fn per_call_timeout(&self) -> Option<Duration> {
        self.per_call_timeout_ms.map(Duration::from_millis)
    }

    /// Whether `name` is the completion tool under the current exit mode
    pub fn is_completion_tool(&self, name: &str) -> bool {
        self.exit_mode == ExitMode::ExplicitTool && self.completion_tool == name
    }

    /// Declaration of the completion tool, if explicit completion is on.
    pub fn completion_tool_definition(&self) -> Option<ToolDefinition> {
        if self.exit_mode != ExitMode::ExplicitTool {
            return None;
        }
        Some(
            ToolDefinition::new(
                self.completion_tool.as_str(),
                "Call this when the task is finished. Ends the conversation.",
            )
            .with_parameter(ToolParameter::new(
                self.summary_field.as_str(),
                "Final summary of what was done",
                true,
            )),
        )
    }

    /// Check the configuration against the registered tools.
    pub fn validate(&self, tools: &ToolSpec) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (field, value) in [
            ("per_call_timeout_ms", self.per_call_timeout_ms),
            ("master_timeout_ms", self.master_timeout_ms),
        ] {
            if value == Some(0) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroValue {
                        field: field.to_string(),
                    },
                    format!("{} cannot be 0", field),
                ));
            }
        }

        if self.max_turns == Some(0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: "max_turns".to_string(),
                },
                "max_turns cannot be 0",
            ));
        }

        if let (Some(per_call), Some(master)) = (self.per_call_timeout_ms, self.master_timeout_ms)
            && per_call >= master
        {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::PerCallTimeoutExceedsMaster,
                format!(
                    "per_call_timeout_ms ({}) is not below master_timeout_ms ({}); the master deadline fires first",
                    per_call, master
                ),
            ));
        }

        if self.exit_mode == ExitMode::ExplicitTool {
            if self.completion_tool.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::MissingCompletionTool,
                    "exit_mode is explicit-tool but completion_tool is empty",
                ));
            } else if tools.contains(&self.completion_tool) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::CompletionToolCollision {
                        name: self.completion_tool.clone(),
                    },
                    format!(
                        "completion_tool '{}' collides with a registered tool",
                        self.completion_tool
                    ),
                ));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::validation::Severity;

    #[test]
    fn defaults() {
        let config = ConversationConfig::default();
        assert_eq!(config.calls_per_turn, CallsPerTurn::All);
        assert_eq!(config.exit_mode, ExitMode::Implicit);
        assert_eq!(config.unknown_tool_policy, UnknownToolPolicy::Report);
        assert_eq!(config.fatal_tool_policy, FatalToolPolicy::Halt);
        assert_eq!(config.turn_delay(), Duration::ZERO);
        assert!(config.per_call_timeout().is_none());
        assert!(config.master_timeout_ms.is_none());
        assert!(config.validate(&ToolSpec::new()).is_empty());
    }

    #[test]
    fn parse_switches() {
        assert_eq!("first".parse::<CallsPerTurn>(), Ok(CallsPerTurn::First));
        assert_eq!("ALL".parse::<CallsPerTurn>(), Ok(CallsPerTurn::All));
        assert_eq!("explicit-tool".parse::<ExitMode>(), Ok(ExitMode::ExplicitTool));
        assert_eq!("explicit_tool".parse::<ExitMode>(), Ok(ExitMode::ExplicitTool));
        assert_eq!("skip".parse::<UnknownToolPolicy>(), Ok(UnknownToolPolicy::Skip));
        assert_eq!("report".parse::<FatalToolPolicy>(), Ok(FatalToolPolicy::Report));
        assert!("sometimes".parse::<CallsPerTurn>().is_err());
    }

    #[test]
    fn completion_tool_only_in_explicit_mode() {
        let implicit = ConversationConfig::default();
        assert!(!implicit.is_completion_tool("finish"));
        assert!(implicit.completion_tool_definition().is_none());

        let explicit = ConversationConfig::default().with_explicit_completion("done");
        assert!(explicit.is_completion_tool("done"));
        assert!(!explicit.is_completion_tool("finish"));

        let definition = explicit.completion_tool_definition().unwrap();
        assert_eq!(definition.name, "done");
        assert_eq!(definition.parameters[0].name, "summary");
        assert!(definition.parameters[0].required);
    }

    #[test]
    fn zero_timeouts_are_errors() {
        let config = ConversationConfig::default()
            .with_per_call_timeout_ms(0)
            .with_master_timeout_ms(0)
            .with_max_turns(0);
        let issues = config.validate(&ToolSpec::new());
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
    }

    #[test]
    fn per_call_above_master_warns() {
        let config = ConversationConfig::default()
            .with_per_call_timeout_ms(500)
            .with_master_timeout_ms(100);
        let issues = config.validate(&ToolSpec::new());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].code, ConfigIssueCode::PerCallTimeoutExceedsMaster);
    }

    #[test]
    fn completion_tool_collision_is_error() {
        let mut tools = ToolSpec::new();
        tools
            .register(ToolDefinition::new("finish", "a real tool"))
            .unwrap();

        let config = ConversationConfig::default().with_explicit_completion("finish");
        let issues = config.validate(&tools);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].code,
            ConfigIssueCode::CompletionToolCollision {
                name: "finish".to_string()
            }
        );

        // Same name is harmless in implicit mode
        assert!(ConversationConfig::default().validate(&tools).is_empty());
    }

    #[test]
    fn empty_completion_tool_is_error() {
        let config = ConversationConfig::default().with_explicit_completion("  ");
        let issues = config.validate(&ToolSpec::new());
        assert_eq!(issues[0].code, ConfigIssueCode::MissingCompletionTool);
    }

    #[test]
    fn deserialize_kebab_exit_mode() {
        let config: ConversationConfig =
            serde_json::from_value(serde_json::json!({"exit_mode": "explicit-tool", "calls_per_turn": "first"}))
                .unwrap();
        assert_eq!(config.exit_mode, ExitMode::ExplicitTool);
        assert_eq!(config.calls_per_turn, CallsPerTurn::First);
        assert_eq!(config.completion_tool, DEFAULT_COMPLETION_TOOL);
    }
}
