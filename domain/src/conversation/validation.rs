//! Structured configuration issues.
//!
//! Configuration is checked up front and every problem is reported at
//! once rather than failing on the first. Callers decide what to do with
//! warnings; any [`Severity::Error`] prevents a conversation from starting.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A timeout or limit that must be positive was set to zero.
    ZeroValue { field: String },
    /// The per-call timeout can never fire before the master deadline.
    PerCallTimeoutExceedsMaster,
    /// The completion tool shares its name with a registered tool.
    CompletionToolCollision { name: String },
    /// Explicit completion was requested without a completion tool name.
    MissingCompletionTool,
    /// A configured tool cannot be built (missing command, URL, ...).
    InvalidToolConfig { name: String },
    /// An enum-like string field had an unrecognized value.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Whether any of the issues is an error
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", label, self.message)
    }
}
