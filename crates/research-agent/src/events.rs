// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use research_tools::ToolCall;

/// Events emitted by a [`crate::agent::ToolLoopAgent`] as it runs, for
/// consumers (the supervisor, a CLI progress line) that want to observe
/// progress without waiting for the final notes.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A complete text response from the model for this iteration.
    TextComplete(String),
    /// The model requested a tool call.
    ToolCallStarted(ToolCall),
    /// A tool call finished.
    ToolCallFinished { call_id: String, tool_name: String, output: String, is_error: bool },
    /// The agent reached a terminal state.
    Terminated(TerminationReason),
}

/// Why a [`crate::agent::ToolLoopAgent`] stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The model produced a turn with no tool calls, or called `research_complete`.
    Completed,
    /// `iterations > max_iterations` or `tool_calls > max_tool_calls`.
    BudgetExhausted,
    /// The transcript could not be truncated any further after a token-limit error.
    TokenLimitExhausted,
    /// The run-scoped cancellation token was observed set.
    Cancelled,
}
