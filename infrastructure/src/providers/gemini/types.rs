//! Gemini `generateContent` wire types and conversions
//!
//! Only the subset of the API used by the relay is modelled. Unknown
//! response fields are ignored.

use relay_domain::{ContentBlock, Message, ModelResponse, ToolCall};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ROLE_USER: &str = "user";
pub const ROLE_MODEL: &str = "model";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: &'a [Content],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some(ROLE_USER.to_string()),
            parts,
        }
    }

    pub fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    /// `{"result": ...}` or `{"error": "..."}`
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub function_declarations: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Build the `tools` entry from declaration objects.
///
/// Gemini rejects an object schema without properties, so declarations
/// of parameterless tools drop their `parameters` entirely.
pub fn convert_declarations(declarations: &[serde_json::Value]) -> Vec<Tool> {
    if declarations.is_empty() {
        return Vec::new();
    }

    let function_declarations = declarations
        .iter()
        .map(|declaration| {
            let mut declaration = declaration.clone();
            let no_properties = declaration["parameters"]["properties"]
                .as_object()
                .is_none_or(|p| p.is_empty());
            if no_properties && let Some(obj) = declaration.as_object_mut() {
                obj.remove("parameters");
            }
            declaration
        })
        .collect();

    vec![Tool {
        function_declarations,
    }]
}

/// Convert a driver message into a user turn.
///
/// A task is a single text part. An outcome batch becomes one
/// `functionResponse` part per outcome, in order; an empty batch is sent
/// as the text `[]` because a turn cannot have zero parts.
pub fn convert_message(message: &Message) -> Content {
    match message {
        Message::Task(text) => Content::user(vec![Part::text(text.as_str())]),
        Message::Outcomes(outcomes) if outcomes.is_empty() => Content::user(vec![Part::text("[]")]),
        Message::Outcomes(outcomes) => Content::user(
            outcomes
                .iter()
                .map(|outcome| {
                    let wire = outcome.to_wire();
                    Part {
                        function_response: Some(FunctionResponse {
                            name: outcome.tool_name.clone(),
                            response: wire["response"].clone(),
                        }),
                        ..Default::default()
                    }
                })
                .collect(),
        ),
    }
}

/// Append a user turn to the history.
///
/// Every `functionCall` in the preceding model turn must be answered by a
/// `functionResponse` in the next user turn. The driver may answer fewer
/// calls than the model made (only the first call, skipped unknown tools,
/// calls left over after a fatal failure), so unanswered calls are removed
/// from the model turn first, matching by name in order. A model turn left
/// with no parts is dropped, and consecutive user turns are merged.
pub fn push_user_turn(contents: &mut Vec<Content>, turn: Content) {
    if let Some(last) = contents.last_mut()
        && last.role.as_deref() == Some(ROLE_MODEL)
    {
        let mut pending: Vec<&str> = turn
            .parts
            .iter()
            .filter_map(|part| part.function_response.as_ref())
            .map(|response| response.name.as_str())
            .collect();
        let before = last.parts.len();
        last.parts.retain(|part| match &part.function_call {
            None => true,
            Some(call) => match pending.iter().position(|name| *name == call.name) {
                Some(index) => {
                    pending.remove(index);
                    true
                }
                None => false,
            },
        });
        let dropped = before - last.parts.len();
        if dropped > 0 {
            debug!(dropped, "Removed unanswered function calls from the model turn");
        }
        if last.parts.is_empty() {
            contents.pop();
        }
    }

    match contents.last_mut() {
        Some(last) if last.role.as_deref() == Some(ROLE_USER) => last.parts.extend(turn.parts),
        _ => contents.push(turn),
    }
}

/// Convert the parts of a model turn into a response.
pub fn convert_content(content: &Content) -> ModelResponse {
    let blocks = content
        .parts
        .iter()
        .filter_map(|part| {
            if let Some(call) = &part.function_call {
                Some(ContentBlock::call(ToolCall::from_json(
                    call.name.as_str(),
                    call.args.clone(),
                )))
            } else {
                part.text.as_deref().map(ContentBlock::text)
            }
        })
        .collect();
    ModelResponse::from_blocks(blocks)
}
