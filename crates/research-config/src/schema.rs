// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// One of the search backends a `SearchProvider` may be configured to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchApi {
    Tavily,
    Searxng,
    Anthropic,
    Openai,
    None,
}

impl Default for SearchApi {
    fn default() -> Self {
        SearchApi::None
    }
}

/// Optional extension-tool loading via an MCP-compatible server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    pub url: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub auth_required: bool,
}

/// Immutable, per-run configuration threaded into every component.
///
/// Constructed once by [`crate::load`] and shared read-only for the
/// duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub summarization_model: String,
    pub research_model: String,
    pub compression_model: String,
    pub final_report_model: String,

    pub search_api: SearchApi,
    pub searxng_url: Option<String>,

    pub max_concurrent_research_units: usize,
    pub max_iterations: usize,
    pub max_tool_calls: usize,
    pub max_structured_output_retries: usize,
    pub max_content_length: usize,
    pub summarization_model_max_tokens: usize,

    pub allow_clarification: bool,
    pub max_replanning_rounds: usize,

    pub mcp_config: Option<McpConfig>,

    /// Read API keys from `apiKeys.<KEY_NAME>` in the config file instead of
    /// environment variables (see `GET_API_KEYS_FROM_CONFIG`).
    pub get_api_keys_from_config: bool,
    #[serde(default)]
    pub api_keys: std::collections::HashMap<String, String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            summarization_model: "openai:gpt-4o-mini".to_string(),
            research_model: "openai:gpt-4o".to_string(),
            compression_model: "openai:gpt-4o".to_string(),
            final_report_model: "openai:gpt-4o".to_string(),

            search_api: SearchApi::None,
            searxng_url: None,

            max_concurrent_research_units: 3,
            max_iterations: 10,
            max_tool_calls: 20,
            max_structured_output_retries: 3,
            max_content_length: 50_000,
            summarization_model_max_tokens: 1_000,

            allow_clarification: true,
            max_replanning_rounds: 3,

            mcp_config: None,

            get_api_keys_from_config: false,
            api_keys: std::collections::HashMap::new(),
        }
    }
}

impl RuntimeConfig {
    /// Resolve a named API key per the two credential sources: environment
    /// variable by default, or `apiKeys.<config_key>` when
    /// `get_api_keys_from_config` is set.
    pub fn api_key(&self, env_var: &str, config_key: &str) -> Option<String> {
        if self.get_api_keys_from_config {
            self.api_keys.get(config_key).cloned()
        } else {
            std::env::var(env_var).ok()
        }
    }
}
