//! Presentation layer for agent-relay
//!
//! CLI definitions, result formatting and progress reporting.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{CallsPerTurnArg, Cli, ExitModeArg, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
