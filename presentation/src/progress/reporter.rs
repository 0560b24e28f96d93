//! Progress reporting for conversation execution

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use relay_application::ports::progress::ConversationProgressNotifier;
use relay_domain::{ConversationPhase, ModelResponse, TerminationReason, ToolCall, ToolOutcome};
use std::sync::Mutex;
use std::time::Duration;

/// Spinner showing the current phase, with one line per tool result
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut guard) = self.spinner.lock() else {
            return;
        };
        let spinner = guard.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        f(spinner);
    }

    fn phase_message(phase: ConversationPhase) -> &'static str {
        match phase {
            ConversationPhase::AwaitingResponse => "Waiting for the model...",
            ConversationPhase::Executing => "Running tools...",
            ConversationPhase::Sending => "Sending results...",
            ConversationPhase::Terminated => "Done",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationProgressNotifier for ProgressReporter {
    fn on_phase(&self, phase: ConversationPhase, turn: usize) {
        if phase == ConversationPhase::Terminated {
            return;
        }
        self.with_spinner(|pb| {
            pb.set_prefix(format!("Turn {}", turn));
            pb.set_message(Self::phase_message(phase));
        });
    }

    fn on_tool_call(&self, call: &ToolCall) {
        self.with_spinner(|pb| pb.set_message(format!("Running {}...", call.tool_name)));
    }

    fn on_tool_result(&self, outcome: &ToolOutcome) {
        let line = match outcome.error() {
            None => format!("  {} {}", "v".green(), outcome.tool_name),
            Some(error) => format!("  {} {}: {}", "x".red(), outcome.tool_name, error.message),
        };
        self.with_spinner(|pb| pb.println(line));
    }

    fn on_terminated(&self, reason: &TerminationReason) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(pb) = guard.take()
        {
            let message = if reason.is_success() {
                reason.label().green().to_string()
            } else {
                reason.label().red().to_string()
            };
            pb.finish_with_message(message);
        }
    }
}

/// Simple line-based progress on stderr (no spinner)
pub struct SimpleProgress;

impl ConversationProgressNotifier for SimpleProgress {
    fn on_model_response(&self, turn: usize, response: &ModelResponse) {
        match response {
            ModelResponse::Calls { invocations } => {
                let names: Vec<&str> = invocations.iter().map(|c| c.tool_name.as_str()).collect();
                eprintln!("{} Turn {}: {}", "->".cyan(), turn, names.join(", ").bold());
            }
            ModelResponse::Text { .. } => {
                eprintln!("{} Turn {}: text answer", "->".cyan(), turn);
            }
        }
    }

    fn on_tool_result(&self, outcome: &ToolOutcome) {
        match outcome.error() {
            None => eprintln!("  {} {}", "v".green(), outcome.tool_name),
            Some(error) => eprintln!("  {} {} ({})", "x".red(), outcome.tool_name, error.message),
        }
    }

    fn on_terminated(&self, reason: &TerminationReason) {
        eprintln!("{} {}", "Ended:".bold(), reason);
    }
}
