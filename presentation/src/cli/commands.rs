//! CLI command definitions

use clap::{Parser, ValueEnum};
use relay_domain::{CallsPerTurn, ConversationConfig, ExitMode};
use std::path::PathBuf;

/// Output format for the conversation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Termination reason, final text and a per-turn summary
    #[default]
    Text,
    /// The full conversation state as JSON
    Json,
}

/// `--calls-per-turn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CallsPerTurnArg {
    /// Execute only the first requested call
    First,
    /// Execute every requested call concurrently
    All,
}

impl From<CallsPerTurnArg> for CallsPerTurn {
    fn from(arg: CallsPerTurnArg) -> Self {
        match arg {
            CallsPerTurnArg::First => CallsPerTurn::First,
            CallsPerTurnArg::All => CallsPerTurn::All,
        }
    }
}

/// `--exit-mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExitModeArg {
    /// A text answer ends the conversation
    Implicit,
    /// Only the completion tool ends the conversation
    ExplicitTool,
}

impl From<ExitModeArg> for ExitMode {
    fn from(arg: ExitModeArg) -> Self {
        match arg {
            ExitModeArg::Implicit => ExitMode::Implicit,
            ExitModeArg::ExplicitTool => ExitMode::ExplicitTool,
        }
    }
}

/// CLI arguments for agent-relay
#[derive(Parser, Debug)]
#[command(name = "agent-relay")]
#[command(author, version, about = "Drive a tool-calling conversation between a model and external tools")]
#[command(long_about = r#"
agent-relay hands a task to a language model, executes the tools it asks
for, sends the results back and repeats until the model stops calling
tools, calls the completion tool, or a limit is hit.

Tools are declared in configuration ([tools.command.<name>] and
[tools.http.<name>]). Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./relay.toml        Project-level config
3. ~/.config/agent-relay/config.toml   Global config
Environment variables prefixed AGENT_RELAY_ override files
(e.g. AGENT_RELAY_CONVERSATION__MAX_TURNS=5).

Example:
  agent-relay "Check the available margin and report it"
  agent-relay --exit-mode explicit-tool --master-timeout-ms 60000 --task-file task.md
  agent-relay --script fixtures/dry-run.json "Rebalance the portfolio"
"#)]
pub struct Cli {
    /// The task handed to the model
    pub task: Option<String>,

    /// Read the task from a file
    #[arg(long, value_name = "PATH", conflicts_with = "task")]
    pub task_file: Option<PathBuf>,

    /// System prompt (overrides [prompt] in configuration)
    #[arg(long, value_name = "TEXT")]
    pub system_prompt: Option<String>,

    /// Replay model responses from a JSON script instead of calling a model
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Execute only the first call of each turn, or all of them
    #[arg(long, value_enum)]
    pub calls_per_turn: Option<CallsPerTurnArg>,

    /// How the conversation ends
    #[arg(long, value_enum)]
    pub exit_mode: Option<ExitModeArg>,

    /// Name of the completion tool (with --exit-mode explicit-tool)
    #[arg(long, value_name = "NAME")]
    pub completion_tool: Option<String>,

    /// Delay before every send after the first (ms)
    #[arg(long, value_name = "MS")]
    pub turn_delay_ms: Option<u64>,

    /// Delay between calls of one turn (ms); calls then run one at a time
    #[arg(long, value_name = "MS")]
    pub call_delay_ms: Option<u64>,

    /// Timeout for each tool call (ms)
    #[arg(long, value_name = "MS")]
    pub per_call_timeout_ms: Option<u64>,

    /// Deadline for the whole conversation (ms)
    #[arg(long, value_name = "MS")]
    pub master_timeout_ms: Option<u64>,

    /// Maximum number of turns
    #[arg(long, value_name = "N")]
    pub max_turns: Option<usize>,

    /// Write the conversation transcript as JSONL to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and the merged configuration, then exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Apply the driver flags on top of a configuration loaded from files.
    pub fn apply_overrides(&self, config: &mut ConversationConfig) {
        if let Some(calls) = self.calls_per_turn {
            config.calls_per_turn = calls.into();
        }
        if let Some(mode) = self.exit_mode {
            config.exit_mode = mode.into();
        }
        if let Some(name) = &self.completion_tool {
            config.completion_tool = name.clone();
        }
        if let Some(ms) = self.turn_delay_ms {
            config.turn_delay_ms = ms;
        }
        if let Some(ms) = self.call_delay_ms {
            config.call_delay_ms = ms;
        }
        if let Some(ms) = self.per_call_timeout_ms {
            config.per_call_timeout_ms = Some(ms);
        }
        if let Some(ms) = self.master_timeout_ms {
            config.master_timeout_ms = Some(ms);
        }
        if let Some(n) = self.max_turns {
            config.max_turns = Some(n);
        }
    }

    /// Filter directive for tracing, from `-q`/`-v`
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
