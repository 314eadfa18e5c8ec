// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Top-level orchestration state machine.
//!
//! Phases run sequentially: clarify (optional) -> brief -> plan -> dispatch
//! -> compress -> [replan] -> report. Each dispatched sub-task gets its own
//! freshly assembled agent rather than reusing one across sub-tasks.

use std::sync::Arc;

use research_config::RuntimeConfig;
use research_model::{Message, ModelAdapter, ModelError};
use research_search::{SearchProvider, Summarizer};
use research_tools::ToolRegistry;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use research_agent::{CancellationToken, ToolLoopAgent};

use crate::credentials::CredentialStore;
use crate::registry::build_research_tool_registry;
use crate::report::ReportWriter;
use crate::schemas::{
    brief_schema, clarification_schema, compression_schema, plan_schema, BriefResult,
    ClarificationDecision, CompressedNotes, PlanResult,
};

/// Fan-out factor applied to `max_concurrent_research_units` to bound how
/// many sub-tasks one planning round may produce.
const PLAN_FANOUT_FACTOR: usize = 3;

/// One sub-task's research brief, paired with the note(s) it produced.
#[derive(Debug, Clone)]
pub struct ResearchNote {
    pub subtask_id: String,
    pub content: String,
}

#[derive(Debug)]
pub enum SupervisorOutcome {
    /// Clarification was requested; the caller must resubmit with the
    /// question answered before the run can proceed.
    ClarificationNeeded(String),
    Report(String),
    /// A catastrophic, non-absorbable failure: cancellation, or a
    /// model-adapter failure at a phase that cannot produce a placeholder.
    Error(String),
}

/// External collaborators the Supervisor composes over one run. Each is a
/// pluggable interface; concrete wiring (which `ModelClient` backs which
/// role, which `SearchProvider` is active) is the caller's responsibility.
pub struct SupervisorDeps {
    /// Drives clarification, brief generation, planning, and every
    /// dispatched `ToolLoopAgent`.
    pub research_adapter: Arc<ModelAdapter>,
    /// Drives the compression phase.
    pub compression_adapter: Arc<ModelAdapter>,
    /// Drives `ReportWriter`.
    pub report_adapter: Arc<ModelAdapter>,
    pub search_provider: Arc<dyn SearchProvider>,
    pub summarizer: Arc<dyn Summarizer>,
    pub credentials: Arc<dyn CredentialStore>,
}

pub struct Supervisor {
    config: Arc<RuntimeConfig>,
    deps: SupervisorDeps,
}

impl Supervisor {
    pub fn new(config: Arc<RuntimeConfig>, deps: SupervisorDeps) -> Self {
        Self { config, deps }
    }

    #[instrument(skip(self, messages, cancel))]
    pub async fn run(&self, messages: Vec<Message>, cancel: CancellationToken) -> SupervisorOutcome {
        if cancel.is_cancelled() {
            return SupervisorOutcome::Error("cancelled before the run started".to_string());
        }

        if self.config.allow_clarification {
            match self.clarify(&messages).await {
                Ok(Some(question)) => return SupervisorOutcome::ClarificationNeeded(question),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "clarification phase failed, proceeding without it"),
            }
        }

        let brief = match self.generate_brief(&messages).await {
            Ok(b) => b,
            Err(e) => return SupervisorOutcome::Error(format!("brief generation failed: {e}")),
        };
        info!(brief = %brief, "research brief established");

        if cancel.is_cancelled() {
            return SupervisorOutcome::Error("cancelled after brief generation".to_string());
        }

        let tool_registry = match build_research_tool_registry(
            self.config.as_ref(),
            self.deps.search_provider.clone(),
            self.deps.summarizer.clone(),
            self.deps.credentials.as_ref(),
        )
        .await
        {
            Ok(reg) => Arc::new(reg),
            Err(e) => return SupervisorOutcome::Error(format!("tool registry setup failed: {e}")),
        };

        let mut all_notes: Vec<ResearchNote> = Vec::new();
        let mut compressed = CompressedNotes::default();
        let mut focus: Option<Vec<String>> = None;

        for round in 0..=self.config.max_replanning_rounds {
            if cancel.is_cancelled() {
                return SupervisorOutcome::Error("cancelled during planning".to_string());
            }

            let subtasks = match self.plan(&brief, focus.as_deref()).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, round, "planning failed, stopping replanning loop");
                    break;
                }
            };
            if subtasks.is_empty() {
                break;
            }

            let round_notes =
                self.dispatch(subtasks, tool_registry.clone(), cancel.clone()).await;
            all_notes.extend(round_notes);

            compressed = match self.compress(&brief, &all_notes).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, round, "compression failed, using notes gathered so far");
                    CompressedNotes {
                        bullet_findings: all_notes.iter().map(|n| n.content.clone()).collect(),
                        open_gaps: vec![],
                    }
                }
            };

            if compressed.open_gaps.is_empty() {
                break;
            }
            focus = Some(compressed.open_gaps.clone());
        }

        if cancel.is_cancelled() {
            return SupervisorOutcome::Error("cancelled before report synthesis".to_string());
        }

        let report = ReportWriter::new(self.deps.report_adapter.clone()).write(&brief, &compressed).await;
        SupervisorOutcome::Report(report)
    }

    async fn clarify(&self, messages: &[Message]) -> Result<Option<String>, ModelError> {
        let mut transcript = messages.to_vec();
        transcript.push(Message::user(
            "Decide whether a clarifying question is needed before research can begin. \
             If the request is already specific enough, answer that none is needed.",
        ));
        let value = self.deps.research_adapter.invoke_structured(transcript, &clarification_schema()).await?;
        let decision: ClarificationDecision = serde_json::from_value(value)
            .map_err(|e| ModelError::StructuredOutputInvalid(e.to_string()))?;
        if decision.needs_clarification && !decision.question.trim().is_empty() {
            Ok(Some(decision.question))
        } else {
            Ok(None)
        }
    }

    async fn generate_brief(&self, messages: &[Message]) -> Result<String, ModelError> {
        let mut transcript = messages.to_vec();
        transcript.push(Message::user(
            "Condense the conversation above into a single, self-contained research brief.",
        ));
        let value = self.deps.research_adapter.invoke_structured(transcript, &brief_schema()).await?;
        let result: BriefResult =
            serde_json::from_value(value).map_err(|e| ModelError::StructuredOutputInvalid(e.to_string()))?;
        Ok(result.brief)
    }

    async fn plan(&self, brief: &str, focus_gaps: Option<&[String]>) -> Result<Vec<String>, ModelError> {
        let max_subtasks = self.config.max_concurrent_research_units * PLAN_FANOUT_FACTOR;
        let prompt = match focus_gaps {
            None => format!(
                "Research brief:\n{brief}\n\nProduce up to {max_subtasks} focused sub-task briefs, \
                 each independently researchable by one agent."
            ),
            Some(gaps) => format!(
                "Research brief:\n{brief}\n\nThe following gaps remain open after earlier research \
                 rounds:\n{}\n\nProduce up to {max_subtasks} focused sub-task briefs that address \
                 only these gaps.",
                gaps.iter().map(|g| format!("- {g}")).collect::<Vec<_>>().join("\n")
            ),
        };
        let value =
            self.deps.research_adapter.invoke_structured(vec![Message::user(prompt)], &plan_schema()).await?;
        let result: PlanResult =
            serde_json::from_value(value).map_err(|e| ModelError::StructuredOutputInvalid(e.to_string()))?;
        let mut subtasks = result.subtasks;
        subtasks.truncate(max_subtasks);
        Ok(subtasks)
    }

    async fn compress(&self, brief: &str, notes: &[ResearchNote]) -> Result<CompressedNotes, ModelError> {
        let notes_text = notes
            .iter()
            .map(|n| format!("[{}] {}", n.subtask_id, n.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = format!(
            "Research brief:\n{brief}\n\nRaw notes gathered by sub-agents:\n{notes_text}\n\n\
             Condense the notes into bullet findings that directly answer the brief, and list any \
             open gaps that still need research. An empty open_gaps list means the brief is fully \
             answered."
        );
        let value = self
            .deps
            .compression_adapter
            .invoke_structured(vec![Message::user(prompt)], &compression_schema())
            .await?;
        serde_json::from_value(value).map_err(|e| ModelError::StructuredOutputInvalid(e.to_string()))
    }

    async fn dispatch(
        &self,
        subtasks: Vec<String>,
        tool_registry: Arc<ToolRegistry>,
        cancel: CancellationToken,
    ) -> Vec<ResearchNote> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_research_units.max(1)));
        let mut handles = Vec::with_capacity(subtasks.len());

        for brief in subtasks {
            let subtask_id = uuid::Uuid::new_v4().to_string();
            let semaphore = semaphore.clone();
            let adapter = self.deps.research_adapter.clone();
            let registry = tool_registry.clone();
            let cancel = cancel.clone();
            let max_iterations = self.config.max_iterations;
            let max_tool_calls = self.config.max_tool_calls;

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => return run_failed(&subtask_id, "semaphore closed"),
                };
                if cancel.is_cancelled() {
                    return run_failed(&subtask_id, "cancelled before dispatch");
                }

                let mut agent =
                    ToolLoopAgent::new(adapter, registry, max_iterations, max_tool_calls, cancel);
                agent.seed(vec![
                    Message::system(
                        "You are a focused research sub-agent. Use the available tools to \
                         investigate your assigned brief, then call research_complete once you \
                         have enough information.",
                    ),
                    Message::user(brief),
                ]);

                match agent.run(None).await {
                    Ok(output) if output.notes.is_empty() => match output.final_message {
                        Some(text) => vec![ResearchNote { subtask_id, content: text }],
                        None => vec![],
                    },
                    Ok(output) => output
                        .notes
                        .into_iter()
                        .map(|content| ResearchNote { subtask_id: subtask_id.clone(), content })
                        .collect(),
                    Err(e) => run_failed(&subtask_id, &e.to_string()),
                }
            }));
        }

        let mut notes = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(mut n) => notes.append(&mut n),
                Err(e) => warn!(error = %e, "sub-task task panicked"),
            }
        }
        notes
    }
}

fn run_failed(subtask_id: &str, reason: &str) -> Vec<ResearchNote> {
    vec![ResearchNote {
        subtask_id: subtask_id.to_string(),
        content: format!("(sub-task failed: {reason})"),
    }]
}
