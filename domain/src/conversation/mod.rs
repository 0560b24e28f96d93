//! Conversation domain.
//!
//! State, configuration and termination reasons for the conversation
//! driver. The driver itself is an application-layer use case; this module
//! holds only the data it owns and the rules that need no I/O.
//!
//! - [`ConversationConfig`]: orthogonal turn-policy switches
//! - [`ConversationState`]: turn index, audit history, termination
//! - [`TerminationReason`]: the one way a conversation ended
//! - [`ConfigIssue`]: structured validation result

pub mod config;
pub mod state;
pub mod termination;
pub mod validation;

pub use config::{
    CallsPerTurn, ConversationConfig, ExitMode, FatalToolPolicy, UnknownToolPolicy,
};
pub use state::{ConversationPhase, ConversationState, Exchange, TurnRecord};
pub use termination::TerminationReason;
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
