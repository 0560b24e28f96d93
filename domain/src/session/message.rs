//! Messages sent from the driver to the model.

use crate::tool::value_objects::ToolOutcome;
use serde::{Deserialize, Serialize};

/// A message handed to a model session.
///
/// The first message of a conversation is always the task; every later
/// message is the outcome batch of the previous turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Message {
    /// Natural-language task description
    Task(String),
    /// Outcomes of the previous turn, in request order
    Outcomes(Vec<ToolOutcome>),
}

impl Message {
    pub fn task(text: impl Into<String>) -> Self {
        Message::Task(text.into())
    }

    /// Deterministic wire body.
    ///
    /// A task is sent verbatim; an outcome batch is a JSON array of
    /// `{functionName, response}` entries in request order.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            Message::Task(text) => serde_json::Value::String(text.clone()),
            Message::Outcomes(outcomes) => {
                serde_json::Value::Array(outcomes.iter().map(|o| o.to_wire()).collect())
            }
        }
    }

    /// Number of outcomes carried (zero for a task)
    pub fn outcome_count(&self) -> usize {
        match self {
            Message::Task(_) => 0,
            Message::Outcomes(outcomes) => outcomes.len(),
        }
    }
}
