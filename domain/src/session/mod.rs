//! Model session domain.
//!
//! - [`message::Message`]: what the driver sends: the task, or an outcome batch
//! - [`response::ModelResponse`]: what comes back: text, or tool calls
//! - [`response::ContentBlock`]: raw blocks adapters parse before collapsing
//!   them into a [`response::ModelResponse`]

pub mod message;
pub mod response;
