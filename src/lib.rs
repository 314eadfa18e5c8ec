// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Composition root for the deep-research engine.
//!
//! Re-exports the public API of each `research-*` crate and provides
//! [`run_research`], the single entry point a caller (a CLI, a service
//! handler) drives to take a user's question through the full
//! clarify/brief/plan/dispatch/compress/report pipeline.

use std::sync::Arc;

pub use research_agent::{CancellationToken, TerminationReason, ToolLoopAgent, ToolLoopOutput};
pub use research_config::{load as load_config, ConfigError, McpConfig, RuntimeConfig, SearchApi};
pub use research_model::{Message, ModelAdapter, ModelClient, ModelError};
pub use research_search::{SearchProvider, SearxngProvider, Summarizer};
pub use research_supervisor::{
    BriefResult, CachedToken, ClarificationDecision, CompressedNotes, CredentialStore,
    InMemoryCredentialStore, PlanResult, ReportWriter, ResearchNote, Supervisor, SupervisorDeps,
    SupervisorError, SupervisorOutcome,
};
pub use research_tools::{ToolCall, ToolDescriptor, ToolRegistry, ToolResult};

/// A user-facing research question, optionally with prior conversation
/// turns (a clarification round-trip resubmits here with the answer
/// appended).
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    pub messages: Vec<Message>,
}

impl ResearchRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self { messages: vec![Message::user(question)] }
    }
}

/// Run one research request to completion against an already-constructed
/// [`Supervisor`].
pub async fn run_research(
    supervisor: &Supervisor,
    request: ResearchRequest,
    cancel: CancellationToken,
) -> SupervisorOutcome {
    supervisor.run(request.messages, cancel).await
}

/// Build the [`Supervisor`]'s dependency set from a single [`ModelClient`]
/// shared across every role and a search backend, for callers that don't
/// need per-role model separation.
pub fn single_model_deps(
    client: Arc<dyn ModelClient>,
    config: &RuntimeConfig,
    search_provider: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
    credentials: Arc<dyn CredentialStore>,
) -> SupervisorDeps {
    let adapter = Arc::new(ModelAdapter::new(client, config.max_structured_output_retries));
    SupervisorDeps {
        research_adapter: adapter.clone(),
        compression_adapter: adapter.clone(),
        report_adapter: adapter,
        search_provider,
        summarizer,
        credentials,
    }
}

/// Initialize the `tracing` subscriber from `RUST_LOG`, defaulting to
/// `warn` when unset. Call once at process start; a no-op test harness
/// should not call this.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".parse().unwrap()),
        )
        .init();
}
