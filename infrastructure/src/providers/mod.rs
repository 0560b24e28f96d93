//! Model gateway adapters
//!
//! - [`gemini`]: HTTP gateway for the Gemini `generateContent` API
//! - [`scripted`]: replays canned responses (dry runs, tests)

pub mod gemini;
pub mod scripted;

pub use gemini::{GeminiConfig, GeminiLlmGateway};
pub use scripted::{ScriptError, ScriptStep, ScriptedLlmGateway};
