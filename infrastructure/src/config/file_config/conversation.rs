//! Conversation configuration from TOML (`[conversation]` section)

use relay_domain::conversation::config::{DEFAULT_COMPLETION_TOOL, DEFAULT_SUMMARY_FIELD};
use relay_domain::{
    CallsPerTurn, ConfigIssue, ConfigIssueCode, ConversationConfig, ExitMode, FatalToolPolicy,
    UnknownToolPolicy,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw conversation driver configuration from TOML
///
/// # Example
///
/// ```toml
/// [conversation]
/// calls_per_turn = "all"            # "all" or "first"
/// exit_mode = "explicit-tool"       # "implicit" or "explicit-tool"
/// completion_tool = "finish"
/// summary_field = "summary"
/// unknown_tool_policy = "report"    # "report" or "skip"
/// fatal_tool_policy = "halt"        # "halt" or "report"
/// turn_delay_ms = 1000
/// call_delay_ms = 0
/// per_call_timeout_ms = 15000
/// master_timeout_ms = 300000
/// max_turns = 40
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConversationConfig {
    pub calls_per_turn: String,
    pub exit_mode: String,
    pub completion_tool: String,
    pub summary_field: String,
    pub unknown_tool_policy: String,
    pub fatal_tool_policy: String,
    pub turn_delay_ms: u64,
    pub call_delay_ms: u64,
    pub per_call_timeout_ms: Option<u64>,
    pub master_timeout_ms: Option<u64>,
    pub max_turns: Option<usize>,
}

impl Default for FileConversationConfig {
    fn default() -> Self {
        Self {
            calls_per_turn: "all".to_string(),
            exit_mode: "implicit".to_string(),
            completion_tool: DEFAULT_COMPLETION_TOOL.to_string(),
            summary_field: DEFAULT_SUMMARY_FIELD.to_string(),
            unknown_tool_policy: "report".to_string(),
            fatal_tool_policy: "halt".to_string(),
            turn_delay_ms: 0,
            call_delay_ms: 0,
            per_call_timeout_ms: None,
            master_timeout_ms: None,
            max_turns: None,
        }
    }
}

/// Parse an enum-like field, falling back to the default with a warning.
fn parse_lenient<T>(field: &str, value: &str, valid: &[&str]) -> (T, Vec<ConfigIssue>)
where
    T: FromStr + Default + std::fmt::Debug,
{
    match value.parse::<T>() {
        Ok(parsed) => (parsed, vec![]),
        Err(_) => {
            let fallback = T::default();
            let issue = ConfigIssue::warning(
                ConfigIssueCode::InvalidEnumValue {
                    field: format!("conversation.{}", field),
                    value: value.to_string(),
                    valid_values: valid.iter().map(|v| v.to_string()).collect(),
                },
                format!(
                    "conversation.{}: unknown value '{}', falling back to {:?}",
                    field, value, fallback
                ),
            );
            (fallback, vec![issue])
        }
    }
}

impl FileConversationConfig {
    /// Convert to the domain config, collecting warnings for values that
    /// could not be parsed.
    pub fn to_conversation_config(&self) -> (ConversationConfig, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let (calls_per_turn, mut found) =
            parse_lenient::<CallsPerTurn>("calls_per_turn", &self.calls_per_turn, &["all", "first"]);
        issues.append(&mut found);
        let (exit_mode, mut found) = parse_lenient::<ExitMode>(
            "exit_mode",
            &self.exit_mode,
            &["implicit", "explicit-tool"],
        );
        issues.append(&mut found);
        let (unknown_tool_policy, mut found) = parse_lenient::<UnknownToolPolicy>(
            "unknown_tool_policy",
            &self.unknown_tool_policy,
            &["report", "skip"],
        );
        issues.append(&mut found);
        let (fatal_tool_policy, mut found) = parse_lenient::<FatalToolPolicy>(
            "fatal_tool_policy",
            &self.fatal_tool_policy,
            &["halt", "report"],
        );
        issues.append(&mut found);

        let config = ConversationConfig {
            calls_per_turn,
            exit_mode,
            completion_tool: self.completion_tool.clone(),
            summary_field: self.summary_field.clone(),
            unknown_tool_policy,
            fatal_tool_policy,
            turn_delay_ms: self.turn_delay_ms,
            call_delay_ms: self.call_delay_ms,
            per_call_timeout_ms: self.per_call_timeout_ms,
            master_timeout_ms: self.master_timeout_ms,
            max_turns: self.max_turns,
        };

        (config, issues)
    }
}
