//! Run Conversation use case
//!
//! Drives a multi-turn tool-calling conversation:
//!
//! ```text
//! AwaitingResponse ──calls──▶ Executing ──outcomes ready──▶ Sending ──┐
//!        ▲                                                            │
//!        └────────────────────────────────────────────────────────────┘
//! AwaitingResponse ──text | completion | fatal error──▶ Terminated
//! ```
//!
//! The loop is iterative (`while !state.is_terminal()`); the driver owns
//! the [`ConversationState`] and commits history one whole turn at a time.
//! The optional master deadline wraps the entire drive, so an expiry
//! abandons the in-flight turn and leaves only completed turns behind.

mod types;

pub use types::{RunConversationError, RunConversationInput, RunConversationOutput};

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{ConversationProgressNotifier, NoConversationProgress};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_schema::ToolSchemaPort;
use crate::use_cases::guard::{ExecutionGuard, millis};
use crate::use_cases::throttle::TurnThrottle;
use futures::future::join_all;
use relay_domain::{
    CallsPerTurn, ConfigIssue, ConversationConfig, ConversationPhase, ConversationState, Exchange,
    FatalToolPolicy, Message, ModelResponse, Severity, TerminationReason, ToolCall, ToolError,
    ToolOutcome, TurnRecord, UnknownToolPolicy,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Use case for running one conversation to termination
pub struct RunConversationUseCase<G: LlmGateway + 'static, T: ToolExecutorPort + 'static> {
    gateway: Arc<G>,
    tool_executor: Arc<T>,
    schema: Arc<dyn ToolSchemaPort>,
    logger: Arc<dyn ConversationLogger>,
    cancellation_token: Option<CancellationToken>,
}

impl<G, T> Clone for RunConversationUseCase<G, T>
where
    G: LlmGateway + 'static,
    T: ToolExecutorPort + 'static,
{
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            tool_executor: self.tool_executor.clone(),
            schema: self.schema.clone(),
            logger: self.logger.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

/// What a turn's execution phase decided.
struct TurnResult {
    record: TurnRecord,
    termination: Option<TerminationReason>,
}

impl<G: LlmGateway + 'static, T: ToolExecutorPort + 'static> RunConversationUseCase<G, T> {
    pub fn new(gateway: Arc<G>, tool_executor: Arc<T>, schema: Arc<dyn ToolSchemaPort>) -> Self {
        Self {
            gateway,
            tool_executor,
            schema,
            logger: Arc::new(NoConversationLogger),
            cancellation_token: None,
        }
    }

    /// Set a structured transcript logger
    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Execute without progress reporting
    pub async fn execute(
        &self,
        input: RunConversationInput,
    ) -> Result<RunConversationOutput, RunConversationError> {
        self.execute_with_progress(input, &NoConversationProgress)
            .await
    }

    /// Execute the conversation, reporting progress along the way.
    ///
    /// Returns `Err` only when the configuration is rejected before the
    /// first gateway call. Every other ending, good or bad, is an `Ok`
    /// output carrying the final state; use
    /// [`RunConversationOutput::into_result`] to turn fatal endings into
    /// errors.
    pub async fn execute_with_progress(
        &self,
        input: RunConversationInput,
        progress: &dyn ConversationProgressNotifier,
    ) -> Result<RunConversationOutput, RunConversationError> {
        let issues = input.config.validate(self.tool_executor.tool_spec());
        for issue in &issues {
            warn!("{}", issue);
        }
        if ConfigIssue::has_errors(&issues) {
            let message = issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RunConversationError::InvalidConfig(message));
        }

        let config = &input.config;
        info!(
            tools = self.tool_executor.tool_spec().len(),
            calls_per_turn = config.calls_per_turn.as_str(),
            exit_mode = config.exit_mode.as_str(),
            "Starting conversation"
        );
        self.logger.log(ConversationEvent::new(
            "conversation_started",
            json!({
                "task": input.task,
                "tools": self.tool_executor.available_tools(),
                "config": config,
            }),
        ));

        let mut state = ConversationState::new();

        match config.master_timeout_ms {
            Some(limit_ms) => {
                let limit = Duration::from_millis(limit_ms);
                let timed_out = tokio::time::timeout(limit, self.drive(&input, &mut state, progress))
                    .await
                    .is_err();
                if timed_out {
                    warn!(
                        limit_ms,
                        completed_turns = state.completed_turns(),
                        "Master timeout exceeded; abandoning conversation"
                    );
                    state.terminate(TerminationReason::MasterTimeoutExceeded { limit_ms });
                }
            }
            None => self.drive(&input, &mut state, progress).await,
        }

        if let Some(reason) = state.termination() {
            progress.on_phase(ConversationPhase::Terminated, state.turn_index);
            progress.on_terminated(reason);
            self.logger.log(ConversationEvent::new(
                "conversation_terminated",
                json!({
                    "turn": state.turn_index,
                    "completed_turns": state.completed_turns(),
                    "termination": reason,
                }),
            ));
            if reason.is_success() {
                info!(reason = reason.label(), turns = state.completed_turns(), "Conversation finished");
            } else {
                warn!(reason = reason.label(), "Conversation ended: {}", reason);
            }
        }

        Ok(RunConversationOutput { state })
    }

    /// The turn loop. Returns once `state` is terminal.
    async fn drive(
        &self,
        input: &RunConversationInput,
        state: &mut ConversationState,
        progress: &dyn ConversationProgressNotifier,
    ) {
        let config = &input.config;
        let declarations = self.declarations(config);

        let session = match self
            .cancellable(self.gateway.start(&input.system_prompt, &declarations))
            .await
        {
            None => {
                state.terminate(TerminationReason::Cancelled);
                return;
            }
            Some(Err(e)) => {
                warn!(error = %e, "Failed to open model session");
                state.terminate(TerminationReason::GatewayTransportFailure {
                    message: e.to_string(),
                });
                return;
            }
            Some(Ok(session)) => session,
        };
        let throttle = TurnThrottle::new(config.turn_delay());
        let guard = ExecutionGuard::new(config.per_call_timeout());
        info!(
            model = %session.model(),
            declarations = declarations.len(),
            per_call_timeout_ms = ?guard.timeout().map(millis),
            "Session started"
        );
        let mut message = Message::task(input.task.clone());

        while !state.is_terminal() {
            let turn = state.turn_index;

            if self.is_cancelled() {
                state.terminate(TerminationReason::Cancelled);
                break;
            }
            if let Some(limit) = config.max_turns
                && turn > limit
            {
                state.terminate(TerminationReason::MaxTurnsExceeded { limit });
                break;
            }

            // AwaitingResponse
            progress.on_phase(ConversationPhase::AwaitingResponse, turn);
            if let Message::Outcomes(batch) = &message {
                self.logger.log(ConversationEvent::new(
                    "outcomes_sent",
                    json!({
                        "turn": turn,
                        "count": batch.len(),
                        "outcomes": message.to_wire(),
                    }),
                ));
            }
            debug!(turn, outcomes = message.outcome_count(), "Sending message");

            let response = match self.cancellable(session.send(&message)).await {
                None => {
                    state.terminate(TerminationReason::Cancelled);
                    break;
                }
                Some(Err(e)) => {
                    warn!(turn, error = %e, "Gateway send failed");
                    state.terminate(TerminationReason::GatewayTransportFailure {
                        message: e.to_string(),
                    });
                    break;
                }
                Some(Ok(response)) => response,
            };

            progress.on_model_response(turn, &response);
            self.logger.log(ConversationEvent::new(
                "model_response",
                json!({
                    "turn": turn,
                    "kind": response.kind(),
                    "response": response,
                }),
            ));

            let invocations = match response {
                ModelResponse::Text { content } => {
                    state.terminate(TerminationReason::NoFurtherCalls { text: content });
                    break;
                }
                ModelResponse::Calls { invocations } if invocations.is_empty() => {
                    state.terminate(TerminationReason::NoFurtherCalls {
                        text: String::new(),
                    });
                    break;
                }
                ModelResponse::Calls { invocations } => invocations,
            };

            // Executing
            progress.on_phase(ConversationPhase::Executing, turn);
            let TurnResult {
                record,
                termination,
            } = self
                .execute_turn(turn, invocations, config, &guard, progress)
                .await;

            let outcomes: Vec<ToolOutcome> = record.outcomes().cloned().collect();
            state.commit_turn(record);

            if let Some(reason) = termination {
                state.terminate(reason);
                break;
            }

            // Sending
            progress.on_phase(ConversationPhase::Sending, turn);
            if self.cancellable(throttle.wait()).await.is_none() {
                state.terminate(TerminationReason::Cancelled);
                break;
            }

            message = Message::Outcomes(outcomes);
            state.advance_turn();
        }
    }

    /// Run the calls of one model response and decide whether the turn
    /// ends the conversation.
    async fn execute_turn(
        &self,
        turn: usize,
        mut invocations: Vec<ToolCall>,
        config: &ConversationConfig,
        guard: &ExecutionGuard,
        progress: &dyn ConversationProgressNotifier,
    ) -> TurnResult {
        let mut record = TurnRecord::new(turn);

        if config.calls_per_turn == CallsPerTurn::First && invocations.len() > 1 {
            let dropped = invocations.split_off(1);
            debug!(
                turn,
                dropped = ?dropped.iter().map(|c| c.tool_name.as_str()).collect::<Vec<_>>(),
                "Only the first call of a turn is processed"
            );
            record.skipped.extend(dropped);
        }

        // Calls before the completion tool still run; calls after it do not.
        let mut completion = None;
        if let Some(index) = invocations
            .iter()
            .position(|c| config.is_completion_tool(&c.tool_name))
        {
            let mut rest = invocations.split_off(index);
            completion = Some(rest.remove(0));
            if !rest.is_empty() {
                debug!(turn, skipped = rest.len(), "Ignoring calls after the completion tool");
            }
            record.skipped.extend(rest);
        }

        let mut runnable = Vec::with_capacity(invocations.len());
        for call in invocations {
            if config.unknown_tool_policy == UnknownToolPolicy::Skip
                && !self.tool_executor.has_tool(&call.tool_name)
            {
                warn!(turn, tool = %call.tool_name, "Unknown tool requested; skipping");
                record.skipped.push(call);
            } else {
                runnable.push(call);
            }
        }

        let outcomes = if config.call_delay().is_zero() {
            join_all(
                runnable
                    .iter()
                    .map(|call| self.run_call(call, guard, progress)),
            )
            .await
        } else {
            let call_throttle = TurnThrottle::new(config.call_delay());
            let mut outcomes = Vec::with_capacity(runnable.len());
            for (i, call) in runnable.iter().enumerate() {
                if i > 0 {
                    call_throttle.wait().await;
                }
                outcomes.push(self.run_call(call, guard, progress).await);
            }
            outcomes
        };

        record.exchanges = runnable
            .into_iter()
            .zip(outcomes)
            .map(|(request, outcome)| Exchange { request, outcome })
            .collect();

        if config.fatal_tool_policy == FatalToolPolicy::Halt
            && let Some(reason) = first_fatal(&record)
        {
            record.skipped.extend(completion);
            return TurnResult {
                record,
                termination: Some(reason),
            };
        }

        if let Some(call) = completion {
            let summary = summary_of(&call, &config.summary_field);
            info!(turn, tool = %call.tool_name, "Completion tool called");
            let outcome = ToolOutcome::success(
                call.tool_name.clone(),
                json!({ config.summary_field.as_str(): summary.clone() }),
            );
            record.exchanges.push(Exchange {
                request: call,
                outcome,
            });
            return TurnResult {
                record,
                termination: Some(TerminationReason::ExplicitCompletion { summary }),
            };
        }

        TurnResult {
            record,
            termination: None,
        }
    }

    /// Dispatch one call under the guard, capturing its outcome.
    async fn run_call(
        &self,
        call: &ToolCall,
        guard: &ExecutionGuard,
        progress: &dyn ConversationProgressNotifier,
    ) -> ToolOutcome {
        progress.on_tool_call(call);
        self.logger.log(ConversationEvent::new(
            "tool_call",
            json!({
                "tool": call.tool_name,
                "arguments": call.arguments_json(),
            }),
        ));

        let outcome = if self.tool_executor.has_tool(&call.tool_name) {
            let executor = Arc::clone(&self.tool_executor);
            let owned = call.clone();
            let started = Instant::now();
            let result = guard
                .guard(&call.tool_name, async move { executor.dispatch(&owned).await })
                .await;
            ToolOutcome::from_result(call.tool_name.clone(), result)
                .with_duration(millis(started.elapsed()))
        } else {
            warn!(tool = %call.tool_name, "Unknown tool requested; reporting to model");
            ToolOutcome::failure(
                call.tool_name.clone(),
                ToolError::unknown_tool(&call.tool_name),
            )
        };

        match outcome.error() {
            Some(error) => warn!(tool = %call.tool_name, error = %error, "Tool call failed"),
            None => debug!(tool = %call.tool_name, duration_ms = ?outcome.duration_ms, "Tool call succeeded"),
        }

        progress.on_tool_result(&outcome);
        self.logger.log(ConversationEvent::new(
            "tool_result",
            json!({
                "tool": outcome.tool_name,
                "success": outcome.is_success(),
                "duration_ms": outcome.duration_ms,
                "response": outcome.to_wire()["response"],
            }),
        ));

        outcome
    }

    /// Declaration surface: registered tools in order, plus the
    /// completion tool when the exit mode asks for one.
    fn declarations(&self, config: &ConversationConfig) -> Vec<serde_json::Value> {
        let mut declarations = self
            .schema
            .all_tools_schema(self.tool_executor.tool_spec());
        if let Some(completion) = config.completion_tool_definition() {
            declarations.push(self.schema.tool_to_schema(&completion));
        }
        declarations
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation_token
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    /// Race `operation` against cancellation. `None` means cancelled.
    async fn cancellable<F: Future>(&self, operation: F) -> Option<F::Output> {
        match &self.cancellation_token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => None,
                output = operation => Some(output),
            },
            None => Some(operation.await),
        }
    }
}

/// First fatal failure of a turn, in request order.
fn first_fatal(record: &TurnRecord) -> Option<TerminationReason> {
    record.exchanges.iter().find_map(|exchange| {
        exchange
            .outcome
            .error()
            .filter(|error| error.is_fatal())
            .map(|error| TerminationReason::FatalToolError {
                tool: exchange.request.tool_name.clone(),
                message: error.message.clone(),
            })
    })
}

/// Summary carried by a completion call.
fn summary_of(call: &ToolCall, field: &str) -> String {
    match call.arguments.get(field) {
        Some(serde_json::Value::String(summary)) => summary.clone(),
        Some(other) => other.to_string(),
        None => {
            warn!(tool = %call.tool_name, field, "Completion call has no summary");
            String::new()
        }
    }
}
