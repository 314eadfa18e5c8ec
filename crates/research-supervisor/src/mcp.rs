// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! OAuth 2.0 token-exchange client for extension-tool (MCP) loading.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use research_config::McpConfig;
use research_tools::{CallableHandler, ToolDescriptor};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::credentials::{CachedToken, CredentialStore};
use crate::error::SupervisorError;

const TOKEN_EXCHANGE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const SUBJECT_TOKEN_TYPE: &str = "access_token";

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

/// Error body returned by an MCP token endpoint when the user must
/// complete an out-of-band interaction (e.g. a consent screen) before a
/// token can be issued.
#[derive(Debug, Deserialize)]
struct TokenExchangeError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    interaction_url: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Turn a failed token-exchange response into a [`SupervisorError`].
/// `auth_required` (from `McpConfig`) forces the interaction-required
/// treatment even if the server doesn't label its error that way; otherwise
/// the body's own `error` field is consulted.
fn classify_token_exchange_failure(
    endpoint: &str,
    status: reqwest::StatusCode,
    body: &str,
    auth_required: bool,
) -> SupervisorError {
    if let Ok(err) = serde_json::from_str::<TokenExchangeError>(body) {
        if auth_required || err.error == "interaction_required" {
            return SupervisorError::AuthenticationRequired {
                message: err.error_description.unwrap_or(err.error),
                url: err.interaction_url.unwrap_or_default(),
            };
        }
    }
    SupervisorError::McpTokenExchange(format!("{endpoint} returned {status}"))
}

/// Exchange `subject_token` for a scoped access token at `<mcp_url>/oauth/token`,
/// caching the result under `cache_key` and evicting anything already expired.
pub async fn exchange_token(
    client: &reqwest::Client,
    mcp_url: &str,
    subject_token: &str,
    store: &dyn CredentialStore,
    cache_key: &str,
    auth_required: bool,
) -> Result<CachedToken, SupervisorError> {
    let now = now_unix();
    store.evict_expired(now).await;
    if let Some(cached) = store.get(cache_key).await {
        if !cached.is_expired(now) {
            return Ok(cached);
        }
    }

    let endpoint = format!("{}/oauth/token", mcp_url.trim_end_matches('/'));
    let body = json!({
        "grant_type": TOKEN_EXCHANGE_GRANT_TYPE,
        "subject_token": subject_token,
        "subject_token_type": SUBJECT_TOKEN_TYPE,
    });

    let resp = client
        .post(&endpoint)
        .json(&body)
        .send()
        .await
        .map_err(|e| SupervisorError::McpTokenExchange(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(classify_token_exchange_failure(&endpoint, status, &body, auth_required));
    }

    let parsed: TokenExchangeResponse =
        resp.json().await.map_err(|e| SupervisorError::McpTokenExchange(e.to_string()))?;

    let token = CachedToken {
        access_token: parsed.access_token,
        expires_in: parsed.expires_in,
        created_at: now,
    };
    store.put(cache_key, token.clone()).await;
    Ok(token)
}

/// Handler that invokes one named tool on a remote MCP server over HTTP,
/// authenticated with the cached bearer token.
struct McpToolHandler {
    client: reqwest::Client,
    endpoint: String,
    tool_name: String,
    bearer: String,
}

impl CallableHandler for McpToolHandler {
    fn call(&self, args: Value) -> research_tools::CallableFuture {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let tool_name = self.tool_name.clone();
        let bearer = self.bearer.clone();
        Box::pin(async move {
            let resp = client
                .post(&endpoint)
                .bearer_auth(&bearer)
                .json(&json!({"tool": tool_name, "arguments": args}))
                .send()
                .await?;
            if !resp.status().is_success() {
                anyhow::bail!("mcp tool \"{tool_name}\" returned {}", resp.status());
            }
            Ok(resp.text().await?)
        })
    }
}

/// Build callable [`ToolDescriptor`]s for every tool named in `config.tools`,
/// skipping (with a warning) any name that collides with `existing_names`.
pub async fn load_mcp_tools(
    config: &McpConfig,
    store: &dyn CredentialStore,
    subject_token: &str,
    existing_names: &HashSet<String>,
) -> Result<Vec<Arc<ToolDescriptor>>, SupervisorError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| SupervisorError::McpTokenExchange(e.to_string()))?;

    let cache_key = format!("mcp:{}", config.url);
    let token =
        exchange_token(&client, &config.url, subject_token, store, &cache_key, config.auth_required).await?;
    let endpoint = format!("{}/mcp", config.url.trim_end_matches('/'));

    let mut tools = Vec::new();
    for name in &config.tools {
        if existing_names.contains(name) {
            warn!(tool = %name, "mcp tool name collides with an already-registered tool, skipping");
            continue;
        }
        let handler = McpToolHandler {
            client: client.clone(),
            endpoint: endpoint.clone(),
            tool_name: name.clone(),
            bearer: token.access_token.clone(),
        };
        tools.push(Arc::new(ToolDescriptor::Callable {
            name: name.clone(),
            description: format!("Extension tool \"{name}\" loaded from {}", config.url),
            schema: json!({"type": "object"}),
            handler: Arc::new(handler),
        }));
    }
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::InMemoryCredentialStore;

    #[tokio::test]
    async fn returns_cached_token_without_calling_out() {
        let store = InMemoryCredentialStore::new();
        let now = now_unix();
        store
            .put(
                "mcp:http://example.invalid",
                CachedToken { access_token: "cached".into(), expires_in: 3600, created_at: now },
            )
            .await;
        let client = reqwest::Client::new();
        let token = exchange_token(
            &client,
            "http://example.invalid",
            "subject",
            &store,
            "mcp:http://example.invalid",
            false,
        )
        .await
        .unwrap();
        assert_eq!(token.access_token, "cached");
    }

    #[test]
    fn default_expires_in_is_one_hour() {
        assert_eq!(default_expires_in(), 3600);
    }

    #[test]
    fn interaction_required_body_surfaces_as_authentication_required() {
        let body = serde_json::json!({
            "error": "interaction_required",
            "error_description": "the user must re-authorize this connection",
            "interaction_url": "https://mcp.example.com/consent",
        })
        .to_string();
        let err = classify_token_exchange_failure(
            "https://mcp.example.com/oauth/token",
            reqwest::StatusCode::FORBIDDEN,
            &body,
            false,
        );
        match err {
            SupervisorError::AuthenticationRequired { message, url } => {
                assert_eq!(message, "the user must re-authorize this connection");
                assert_eq!(url, "https://mcp.example.com/consent");
            }
            other => panic!("expected AuthenticationRequired, got {other:?}"),
        }
    }

    #[test]
    fn auth_required_config_forces_authentication_required_even_without_the_error_code() {
        let body = serde_json::json!({"error": "server_error"}).to_string();
        let err = classify_token_exchange_failure(
            "https://mcp.example.com/oauth/token",
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            &body,
            true,
        );
        assert!(matches!(err, SupervisorError::AuthenticationRequired { .. }));
    }

    #[test]
    fn unstructured_failure_body_falls_back_to_generic_error() {
        let err = classify_token_exchange_failure(
            "https://mcp.example.com/oauth/token",
            reqwest::StatusCode::BAD_GATEWAY,
            "upstream timeout",
            false,
        );
        assert!(matches!(err, SupervisorError::McpTokenExchange(_)));
    }
}
