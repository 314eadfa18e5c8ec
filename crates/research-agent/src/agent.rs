// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use research_model::{FunctionCall, Message, ModelAdapter, ModelError, ToolSchema};
use research_tools::{ToolCall, ToolRegistry, RESEARCH_COMPLETE};
use tokio::sync::mpsc;

use crate::events::{AgentEvent, TerminationReason};
use crate::session::Session;

/// Shared flag observed by every `ToolLoopAgent` dispatched within one run.
/// A plain atomic rather than a channel: agents only need to poll it at
/// well-defined suspension points, never await on a change.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The final state of a finished `ToolLoopAgent` run.
#[derive(Debug)]
pub struct ToolLoopOutput {
    /// Every tool-result content string produced during the run, in
    /// execution order — these are the "notes" the supervisor collects.
    pub notes: Vec<String>,
    /// The agent's last text-bearing assistant message, if any.
    pub final_message: Option<String>,
    pub reason: TerminationReason,
    pub iterations: usize,
}

/// Drives a single model ↔ tool loop for one research sub-task until a
/// terminal signal is reached: the `research_complete` tool is called, the
/// model produces a tool-free turn, the iteration/tool-call budget is
/// exhausted, the transcript cannot be truncated any further after a
/// token-limit error, or the run is cancelled.
pub struct ToolLoopAgent {
    session: Session,
    tools: Arc<ToolRegistry>,
    adapter: Arc<ModelAdapter>,
    max_iterations: usize,
    max_tool_calls: usize,
    cancel: CancellationToken,
}

impl ToolLoopAgent {
    pub fn new(
        adapter: Arc<ModelAdapter>,
        tools: Arc<ToolRegistry>,
        max_iterations: usize,
        max_tool_calls: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self { session: Session::new(), tools, adapter, max_iterations, max_tool_calls, cancel }
    }

    /// Seed the transcript (typically a system prompt followed by the
    /// sub-task's research brief) before the first iteration.
    pub fn seed(&mut self, messages: Vec<Message>) {
        self.session.push_many(messages);
    }

    /// Run the loop to completion, optionally streaming [`AgentEvent`]s to
    /// `events` as they occur. Returns once a terminal state is reached.
    pub async fn run(&mut self, events: Option<mpsc::Sender<AgentEvent>>) -> anyhow::Result<ToolLoopOutput> {
        let mut notes = Vec::new();
        let mut final_message = None;
        let mut iterations = 0usize;
        let mut tool_calls_made = 0usize;

        let schemas: Vec<ToolSchema> = self
            .tools
            .schemas()
            .into_iter()
            .map(|s| ToolSchema { name: s.name, description: s.description, parameters: s.parameters })
            .collect();

        loop {
            if self.cancel.is_cancelled() {
                return Ok(ToolLoopOutput {
                    notes,
                    final_message,
                    reason: TerminationReason::Cancelled,
                    iterations,
                });
            }

            iterations += 1;
            if iterations > self.max_iterations || tool_calls_made > self.max_tool_calls {
                return Ok(ToolLoopOutput {
                    notes,
                    final_message,
                    reason: TerminationReason::BudgetExhausted,
                    iterations,
                });
            }

            let turn = match self.adapter.invoke_with_tools(self.session.messages.clone(), schemas.clone()).await {
                Ok(turn) => turn,
                Err(ModelError::TokenLimitExceeded) => {
                    return Ok(ToolLoopOutput {
                        notes,
                        final_message,
                        reason: TerminationReason::TokenLimitExhausted,
                        iterations,
                    });
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(text) = &turn.text {
                if !text.is_empty() {
                    self.session.push(Message::assistant(text));
                    final_message = Some(text.clone());
                    if let Some(tx) = &events {
                        let _ = tx.send(AgentEvent::TextComplete(text.clone())).await;
                    }
                }
            }

            if turn.tool_calls.is_empty() {
                return Ok(ToolLoopOutput {
                    notes,
                    final_message,
                    reason: TerminationReason::Completed,
                    iterations,
                });
            }

            let calls: Vec<ToolCall> = turn
                .tool_calls
                .iter()
                .map(|tc| ToolCall { id: tc.id.clone(), name: tc.name.clone(), args: tc.arguments.clone() })
                .collect();

            if calls.iter().any(|c| c.name == RESEARCH_COMPLETE) {
                return Ok(ToolLoopOutput { notes, final_message, reason: TerminationReason::Completed, iterations });
            }

            for (tc, call) in turn.tool_calls.iter().zip(calls.iter()) {
                self.session.push(Message::tool_call(
                    &tc.id,
                    FunctionCall { name: tc.name.clone(), arguments: tc.arguments.to_string() },
                ));
                if let Some(tx) = &events {
                    let _ = tx.send(AgentEvent::ToolCallStarted(call.clone())).await;
                }
            }

            if self.cancel.is_cancelled() {
                return Ok(ToolLoopOutput {
                    notes,
                    final_message,
                    reason: TerminationReason::Cancelled,
                    iterations,
                });
            }

            let tasks: Vec<_> = calls
                .iter()
                .cloned()
                .map(|call| {
                    let registry = Arc::clone(&self.tools);
                    tokio::spawn(async move { registry.execute(&call).await })
                })
                .collect();

            let mut results = Vec::with_capacity(tasks.len());
            for (i, task) in tasks.into_iter().enumerate() {
                let result = match task.await {
                    Ok(r) => r,
                    Err(e) => research_tools::ToolResult::err(&calls[i].id, format!("tool panicked: {e}")),
                };
                if let Some(tx) = &events {
                    let _ = tx
                        .send(AgentEvent::ToolCallFinished {
                            call_id: result.call_id.clone(),
                            tool_name: calls[i].name.clone(),
                            output: result.content.clone(),
                            is_error: result.is_error,
                        })
                        .await;
                }
                results.push(result);
            }

            for result in &results {
                self.session.push(Message::tool_result(&result.call_id, &result.content));
                notes.push(result.content.clone());
            }

            tool_calls_made += calls.len();
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
