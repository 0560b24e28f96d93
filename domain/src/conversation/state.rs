//! Conversation state owned by the driver.

use super::termination::TerminationReason;
use crate::tool::entities::ToolCall;
use crate::tool::value_objects::ToolOutcome;
use serde::{Deserialize, Serialize};

/// Where the driver is in its turn cycle.
///
/// ```text
/// AwaitingResponse ──calls──▶ Executing ──results ready──▶ Sending ──▶ AwaitingResponse
///        │
///        └── text | completion | error ──▶ Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    AwaitingResponse,
    Executing,
    Sending,
    Terminated,
}

impl ConversationPhase {
    pub fn as_str(&self) -> &str {
        match self {
            ConversationPhase::AwaitingResponse => "awaiting_response",
            ConversationPhase::Executing => "executing",
            ConversationPhase::Sending => "sending",
            ConversationPhase::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One executed invocation: what was asked and what came of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub request: ToolCall,
    pub outcome: ToolOutcome,
}

/// Audit record of one completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 1-based turn number
    pub turn: usize,
    /// Executed invocations, in request order
    pub exchanges: Vec<Exchange>,
    /// Requests that were not executed (dropped by policy or after completion)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ToolCall>,
}

impl TurnRecord {
    pub fn new(turn: usize) -> Self {
        Self {
            turn,
            exchanges: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Outcomes in request order
    pub fn outcomes(&self) -> impl Iterator<Item = &ToolOutcome> {
        self.exchanges.iter().map(|e| &e.outcome)
    }
}

/// Mutable state of one conversation.
///
/// Mutated only at turn boundaries: a turn's exchanges are committed
/// together, so a conversation abandoned mid-turn keeps only completed
/// turns in its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// 1-based index of the current turn
    pub turn_index: usize,
    pub history: Vec<TurnRecord>,
    termination: Option<TerminationReason>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            turn_index: 1,
            history: Vec::new(),
            termination: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.termination.is_some()
    }

    pub fn termination(&self) -> Option<&TerminationReason> {
        self.termination.as_ref()
    }

    /// Record the termination reason.
    ///
    /// Returns `false` and keeps the original reason if the conversation
    /// has already terminated.
    pub fn terminate(&mut self, reason: TerminationReason) -> bool {
        if self.termination.is_some() {
            return false;
        }
        self.termination = Some(reason);
        true
    }

    /// Commit a completed turn to history.
    pub fn commit_turn(&mut self, record: TurnRecord) {
        self.history.push(record);
    }

    /// Move on to the next turn.
    pub fn advance_turn(&mut self) {
        self.turn_index += 1;
    }

    /// Every executed exchange across all turns, in order
    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.history.iter().flat_map(|t| t.exchanges.iter())
    }

    pub fn completed_turns(&self) -> usize {
        self.history.len()
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(name: &str) -> Exchange {
        Exchange {
            request: ToolCall::new(name),
            outcome: ToolOutcome::success(name, serde_json::json!(null)),
        }
    }

    #[test]
    fn new_state_starts_at_turn_one() {
        let state = ConversationState::new();
        assert_eq!(state.turn_index, 1);
        assert!(!state.is_terminal());
        assert!(state.history.is_empty());
    }

    #[test]
    fn terminate_only_once() {
        let mut state = ConversationState::new();
        assert!(state.terminate(TerminationReason::Cancelled));
        assert!(!state.terminate(TerminationReason::MaxTurnsExceeded { limit: 1 }));
        assert_eq!(state.termination(), Some(&TerminationReason::Cancelled));
        assert!(state.is_terminal());
    }

    #[test]
    fn exchanges_flatten_in_order() {
        let mut state = ConversationState::new();
        let mut first = TurnRecord::new(1);
        first.exchanges.push(exchange("a"));
        first.exchanges.push(exchange("b"));
        state.commit_turn(first);
        state.advance_turn();

        let mut second = TurnRecord::new(2);
        second.exchanges.push(exchange("c"));
        state.commit_turn(second);

        let names: Vec<&str> = state.exchanges().map(|e| e.request.tool_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(state.completed_turns(), 2);
        assert_eq!(state.turn_index, 2);
    }
}
