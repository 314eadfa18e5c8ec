// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Centralised tool-registry builder for per-sub-task [`research_agent::ToolLoopAgent`]s.
//!
//! All callers (the `Supervisor`'s dispatch phase, tests, a future CLI)
//! build their agent's tool set through `build_research_tool_registry`
//! instead of each inlining their own registration loop.

use std::collections::HashSet;
use std::sync::Arc;

use research_config::RuntimeConfig;
use research_model::ModelAdapter;
use research_search::{web_search_tool, SearchProvider, Summarizer};
use research_tools::{research_complete_tool, think_tool, ToolRegistry};

use crate::credentials::CredentialStore;
use crate::error::SupervisorError;
use crate::mcp;

/// Build the tool set exposed to every research sub-agent: `think`,
/// `research_complete`, `web_search` (unless search is disabled), plus any
/// extension tools loaded over MCP.
pub async fn build_research_tool_registry(
    config: &RuntimeConfig,
    provider: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
    credentials: &dyn CredentialStore,
) -> Result<ToolRegistry, SupervisorError> {
    let mut reg = ToolRegistry::new();
    reg.register(think_tool());
    reg.register(research_complete_tool());

    if !matches!(config.search_api, research_config::SearchApi::None) {
        reg.register(web_search_tool(config, provider, summarizer));
    }

    if let Some(mcp_config) = &config.mcp_config {
        let existing: HashSet<String> = reg.names().into_iter().collect();
        let subject_token = std::env::var("MCP_SUBJECT_TOKEN").unwrap_or_default();
        let extension_tools =
            mcp::load_mcp_tools(mcp_config, credentials, &subject_token, &existing).await?;
        for tool in extension_tools {
            reg.register_arc(tool);
        }
    }

    Ok(reg)
}

/// Construct a research sub-agent's [`ModelAdapter`], wired to the
/// `research_model` identifier in `config`.
pub fn research_model_adapter(
    client: Arc<dyn research_model::ModelClient>,
    config: &RuntimeConfig,
) -> Arc<ModelAdapter> {
    Arc::new(ModelAdapter::new(client, config.max_structured_output_retries))
}
