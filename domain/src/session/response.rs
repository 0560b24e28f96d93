//! Model responses.
//!
//! Provider APIs return an array of content blocks mixing text and
//! function calls. Adapters parse those into [`ContentBlock`]s and
//! collapse them with [`ModelResponse::from_blocks`]:
//!
//! ```text
//! [Text, FunctionCall, Text, FunctionCall] ──▶ ModelResponse::Calls([..2])
//! [Text, Text]                             ──▶ ModelResponse::Text("..")
//! []                                       ──▶ ModelResponse::Text("")
//! ```
//!
//! Any function call wins over text: narration that accompanies calls is
//! dropped from the driver's view (adapters may still log it).

use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};

/// A single block of content within a provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    FunctionCall { call: ToolCall },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn call(call: ToolCall) -> Self {
        ContentBlock::FunctionCall { call }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// What a model session returned for one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelResponse {
    /// The model requested one or more tool invocations
    Calls { invocations: Vec<ToolCall> },
    /// The model answered in free text
    Text { content: String },
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        ModelResponse::Text {
            content: content.into(),
        }
    }

    pub fn calls(invocations: Vec<ToolCall>) -> Self {
        ModelResponse::Calls { invocations }
    }

    /// Collapse provider content blocks into a response.
    pub fn from_blocks(blocks: Vec<ContentBlock>) -> Self {
        let mut text = String::new();
        let mut invocations = Vec::new();
        for block in blocks {
            match block {
                ContentBlock::Text { text: t } => text.push_str(&t),
                ContentBlock::FunctionCall { call } => invocations.push(call),
            }
        }
        if invocations.is_empty() {
            ModelResponse::Text { content: text }
        } else {
            ModelResponse::Calls { invocations }
        }
    }

    pub fn has_calls(&self) -> bool {
        matches!(self, ModelResponse::Calls { invocations } if !invocations.is_empty())
    }

    /// Short label for logs and transcripts
    pub fn kind(&self) -> &'static str {
        match self {
            ModelResponse::Calls { .. } => "calls",
            ModelResponse::Text { .. } => "text",
        }
    }
}
