//! Tool domain value objects: failure descriptors and invocation outcomes
//!
//! Every dispatched (or rejected) [`ToolCall`](super::entities::ToolCall)
//! yields exactly one [`ToolOutcome`]. The outcome carries either a
//! success payload or a [`ToolError`], never both; the enum
//! [`OutcomeBody`] makes the other combinations unrepresentable.
//!
//! Only the error *message* crosses the wire to the model. The
//! [`ToolErrorKind`] stays local and drives logging and the driver's
//! fatal-error policy.

use serde::{Deserialize, Serialize};

/// Classification of a tool failure.
///
/// | Kind | Recoverable? | Raised by |
/// |------|:---:|-----------|
/// | `UnknownTool` | yes | registry / driver |
/// | `InvalidArgument` | yes | handler defending itself |
/// | `ExecutionFailed` | yes | handler |
/// | `Timeout` | yes | execution guard |
///
/// A handler may additionally flag any failure as fatal
/// (see [`ToolError::fatal`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolErrorKind {
    UnknownTool,
    InvalidArgument,
    ExecutionFailed,
    Timeout,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ToolErrorKind::UnknownTool => "UNKNOWN_TOOL",
            ToolErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ToolErrorKind::ExecutionFailed => "EXECUTION_FAILED",
            ToolErrorKind::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error that occurred during tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    /// Human-readable message; this is what the model sees
    pub message: String,
    /// Set by handlers that hit an unrecoverable condition
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fatal: false,
        }
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ToolErrorKind::UnknownTool, format!("Unknown tool: {}", name))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArgument, message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionFailed, message)
    }

    /// Timeout failure labelled with the tool and the configured bound.
    pub fn timeout(tool_name: &str, limit_ms: u64) -> Self {
        Self::new(
            ToolErrorKind::Timeout,
            format!("Tool '{}' timed out after {}ms", tool_name, limit_ms),
        )
    }

    /// Mark this failure as unrecoverable.
    pub fn into_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ToolError {}

/// Payload or failure of a single invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeBody {
    Success(serde_json::Value),
    Failure(ToolError),
}

/// Result of one tool invocation, as recorded in history and sent back
/// to the model.
///
/// Equality ignores `duration_ms`: two outcomes are the same when they
/// name the same tool and carry the same body, however long it took.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Name of the tool that was requested
    pub tool_name: String,
    pub body: OutcomeBody,
    /// Time spent waiting on the handler (diagnostic only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl PartialEq for ToolOutcome {
    fn eq(&self, other: &Self) -> bool {
        self.tool_name == other.tool_name && self.body == other.body
    }
}

impl ToolOutcome {
    pub fn success(tool_name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            body: OutcomeBody::Success(payload),
            duration_ms: None,
        }
    }

    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            body: OutcomeBody::Failure(error),
            duration_ms: None,
        }
    }

    /// Build an outcome from a handler result.
    pub fn from_result(
        tool_name: impl Into<String>,
        result: Result<serde_json::Value, ToolError>,
    ) -> Self {
        match result {
            Ok(payload) => Self::success(tool_name, payload),
            Err(error) => Self::failure(tool_name, error),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, OutcomeBody::Success(_))
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        match &self.body {
            OutcomeBody::Success(payload) => Some(payload),
            OutcomeBody::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ToolError> {
        match &self.body {
            OutcomeBody::Success(_) => None,
            OutcomeBody::Failure(error) => Some(error),
        }
    }

    /// Wire form sent to the model: `{functionName, response: {result} | {error}}`.
    ///
    /// The error side carries the message string only; the kind is not
    /// transmitted.
    pub fn to_wire(&self) -> serde_json::Value {
        let response = match &self.body {
            OutcomeBody::Success(payload) => serde_json::json!({ "result": payload }),
            OutcomeBody::Failure(error) => serde_json::json!({ "error": error.message }),
        };
        serde_json::json!({
            "functionName": self.tool_name,
            "response": response,
        })
    }
}
