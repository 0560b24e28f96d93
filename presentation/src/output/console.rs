//! Console output formatter for conversation results

use colored::Colorize;
use relay_domain::{ConversationState, OutcomeBody, TerminationReason};

/// Formats a finished conversation for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Human-readable report: termination, final text, per-turn summary
    pub fn format(task: &str, state: &ConversationState) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Conversation Result"));
        output.push('\n');
        output.push_str(&format!("{} {}\n\n", "Task:".cyan().bold(), task));

        for turn in &state.history {
            output.push_str(&format!("{}\n", format!("── Turn {} ──", turn.turn).yellow().bold()));
            for exchange in &turn.exchanges {
                let duration = exchange
                    .outcome
                    .duration_ms
                    .map(|ms| format!(" ({}ms)", ms))
                    .unwrap_or_default();
                match &exchange.outcome.body {
                    OutcomeBody::Success(payload) => output.push_str(&format!(
                        "  {} {}{} → {}\n",
                        "v".green(),
                        exchange.request.tool_name,
                        duration,
                        Self::excerpt(&payload.to_string(), 120)
                    )),
                    OutcomeBody::Failure(error) => output.push_str(&format!(
                        "  {} {}{} → {}\n",
                        "x".red(),
                        exchange.request.tool_name,
                        duration,
                        error
                    )),
                }
            }
            for skipped in &turn.skipped {
                output.push_str(&format!("  {} {} (skipped)\n", "-".dimmed(), skipped.tool_name));
            }
        }

        output.push('\n');
        match state.termination() {
            Some(reason) => {
                output.push_str(&format!("{} {}\n", "Ended:".cyan().bold(), Self::reason_line(reason)));
                if let Some(text) = reason.final_text()
                    && !text.is_empty()
                {
                    output.push_str(&format!("\n{}\n", text));
                }
            }
            None => output.push_str(&format!("{} {}\n", "Ended:".cyan().bold(), "not terminated".red())),
        }

        output.push_str(&Self::footer());
        output
    }

    /// The full state as pretty JSON
    pub fn format_json(task: &str, state: &ConversationState) -> String {
        let value = serde_json::json!({
            "task": task,
            "success": state.termination().is_some_and(|r| r.is_success()),
            "final_text": state.termination().and_then(|r| r.final_text()),
            "state": state,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    fn reason_line(reason: &TerminationReason) -> String {
        let line = format!("{} ({})", reason, reason.label());
        if reason.is_success() {
            line.green().to_string()
        } else {
            line.red().to_string()
        }
    }

    fn excerpt(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{}\n{}", line.cyan(), title.cyan().bold(), line.cyan())
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}
