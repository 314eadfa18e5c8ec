// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use research_model::{Message, ModelAdapter};
use serde::Deserialize;
use serde_json::json;

const SUMMARIZATION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub key_excerpts: String,
}

impl Summary {
    /// Wraps the summary in the `<summary>`/`<key_excerpts>` delimited
    /// sections a report writer downstream parses back out.
    pub fn format(&self) -> String {
        format!("<summary>\n{}\n</summary>\n\n<key_excerpts>\n{}\n</key_excerpts>", self.summary, self.key_excerpts)
    }
}

fn summary_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["summary", "key_excerpts"],
        "properties": {
            "summary": {"type": "string"},
            "key_excerpts": {"type": "string"}
        }
    })
}

/// Condenses raw webpage content into a [`Summary`]. Implementations that
/// fail or time out should fall back to returning the original content
/// rather than propagating the error — a search result with the raw page
/// text is still useful, one with nothing is not.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, content: &str) -> String;
}

pub struct ModelSummarizer {
    adapter: Arc<ModelAdapter>,
}

impl ModelSummarizer {
    pub fn new(adapter: Arc<ModelAdapter>) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl Summarizer for ModelSummarizer {
    async fn summarize(&self, content: &str) -> String {
        let prompt = format!(
            "Summarize the following webpage content. Produce a concise summary and a \
             short list of the most important verbatim excerpts.\n\n{content}"
        );
        let messages = vec![Message::user(prompt)];

        let outcome =
            tokio::time::timeout(SUMMARIZATION_TIMEOUT, self.adapter.invoke_structured(messages, &summary_schema()))
                .await;

        match outcome {
            Ok(Ok(value)) => match serde_json::from_value::<Summary>(value) {
                Ok(summary) => summary.format(),
                Err(e) => {
                    tracing::warn!(error = %e, "summarizer returned a value that didn't match the Summary schema");
                    content.to_string()
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "summarization failed, falling back to raw content");
                content.to_string()
            }
            Err(_) => {
                tracing::warn!("summarization timed out after 60s, falling back to raw content");
                content.to_string()
            }
        }
    }
}
