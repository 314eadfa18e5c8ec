// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//
// Composes a SearchProvider and a Summarizer into the single callable tool
// research agents use to search the web. Grounded step for step on the
// original `tavily_search`/`searxng_search` tool functions: run every
// query, dedup hits by URL in first-seen order, cap content length before
// summarizing, summarize concurrently, and fall back to the raw content
// wherever a hit has none worth summarizing.
use std::collections::HashMap;
use std::sync::Arc;

use research_config::RuntimeConfig;
use research_tools::{CallableHandler, ToolDescriptor};
use serde_json::{json, Value};

use crate::provider::SearchProvider;
use crate::summarizer::Summarizer;

pub const WEB_SEARCH: &str = "web_search";

pub const EMPTY_RESULTS_MESSAGE: &str =
    "No valid search results found. Please try different search queries or use a different search API.";

struct WebSearchHandler {
    provider: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
    max_content_length: usize,
}

impl CallableHandler for WebSearchHandler {
    fn call(&self, args: Value) -> research_tools::CallableFuture {
        let provider = self.provider.clone();
        let summarizer = self.summarizer.clone();
        let max_content_length = self.max_content_length;
        Box::pin(async move { run_web_search(&*provider, &*summarizer, max_content_length, args).await })
    }
}

async fn run_web_search(
    provider: &dyn SearchProvider,
    summarizer: &dyn Summarizer,
    max_content_length: usize,
    args: Value,
) -> anyhow::Result<String> {
    let queries: Vec<String> = args
        .get("queries")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let max_results = args.get("max_results").and_then(Value::as_u64).unwrap_or(5) as usize;

    if queries.is_empty() {
        anyhow::bail!("web_search requires at least one query");
    }

    let responses = provider.search_many(&queries, max_results).await;

    // Dedup by URL, first-seen order.
    let mut order: Vec<String> = Vec::new();
    let mut by_url: HashMap<String, crate::provider::SearchResult> = HashMap::new();
    for response in responses {
        for result in response.results {
            if !by_url.contains_key(&result.url) {
                order.push(result.url.clone());
                by_url.insert(result.url.clone(), result);
            }
        }
    }

    if order.is_empty() {
        return Ok(EMPTY_RESULTS_MESSAGE.to_string());
    }

    let summaries = futures::future::join_all(order.iter().map(|url| {
        let result = by_url.get(url).expect("url present by construction");
        let truncated: String = result.content.chars().take(max_content_length).collect();
        async move {
            if truncated.is_empty() {
                truncated
            } else {
                summarizer.summarize(&truncated).await
            }
        }
    }))
    .await;

    let mut output = String::from("Search results: \n\n");
    for (i, url) in order.iter().enumerate() {
        let result = &by_url[url];
        output.push_str(&format!("\n\n--- SOURCE {}: {} ---\n", i + 1, result.title));
        output.push_str(&format!("URL: {url}\n\n"));
        output.push_str(&format!("SUMMARY:\n{}\n\n", summaries[i]));
        output.push_str(&format!("\n\n{}\n", "-".repeat(80)));
    }

    Ok(output)
}

pub fn web_search_tool(
    config: &RuntimeConfig,
    provider: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
) -> ToolDescriptor {
    ToolDescriptor::Callable {
        name: WEB_SEARCH.to_string(),
        description: "Search the web for information relevant to one or more queries. \
            Returns deduplicated, summarized results."
            .to_string(),
        schema: json!({
            "type": "object",
            "required": ["queries"],
            "properties": {
                "queries": {"type": "array", "items": {"type": "string"}},
                "max_results": {"type": "integer"}
            }
        }),
        handler: Arc::new(WebSearchHandler {
            provider,
            summarizer,
            max_content_length: config.max_content_length,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{SearchResponse, SearchResult};
    use async_trait::async_trait;

    struct FixedProvider(Vec<SearchResponse>);

    #[async_trait]
    impl SearchProvider for FixedProvider {
        async fn search(&self, query: &str, _max_results: usize) -> SearchResponse {
            self.0.iter().find(|r| r.query == query).cloned().unwrap_or(SearchResponse {
                query: query.to_string(),
                results: vec![],
            })
        }

        async fn search_many(&self, _queries: &[String], _max_results: usize) -> Vec<SearchResponse> {
            self.0.clone()
        }
    }

    struct UppercaseSummarizer;

    #[async_trait]
    impl Summarizer for UppercaseSummarizer {
        async fn summarize(&self, content: &str) -> String {
            content.to_uppercase()
        }
    }

    #[tokio::test]
    async fn empty_results_returns_exact_message() {
        let provider = FixedProvider(vec![]);
        let output =
            run_web_search(&provider, &UppercaseSummarizer, 1000, json!({"queries": ["nothing"]})).await.unwrap();
        assert_eq!(output, EMPTY_RESULTS_MESSAGE);
    }

    #[tokio::test]
    async fn dedups_results_by_url_first_seen() {
        let provider = FixedProvider(vec![
            SearchResponse {
                query: "a".to_string(),
                results: vec![SearchResult {
                    title: "First".to_string(),
                    url: "https://x.com".to_string(),
                    content: "first content".to_string(),
                }],
            },
            SearchResponse {
                query: "b".to_string(),
                results: vec![SearchResult {
                    title: "Duplicate".to_string(),
                    url: "https://x.com".to_string(),
                    content: "second content".to_string(),
                }],
            },
        ]);
        let output =
            run_web_search(&provider, &UppercaseSummarizer, 1000, json!({"queries": ["a", "b"]})).await.unwrap();
        assert_eq!(output.matches("https://x.com").count(), 1);
        assert!(output.contains("First"));
    }

    #[tokio::test]
    async fn summarizes_each_result() {
        let provider = FixedProvider(vec![SearchResponse {
            query: "a".to_string(),
            results: vec![SearchResult {
                title: "T".to_string(),
                url: "https://x.com".to_string(),
                content: "hello".to_string(),
            }],
        }]);
        let output =
            run_web_search(&provider, &UppercaseSummarizer, 1000, json!({"queries": ["a"]})).await.unwrap();
        assert!(output.contains("HELLO"));
    }

    #[tokio::test]
    async fn truncates_content_before_summarizing() {
        let long_content = "x".repeat(100);
        let provider = FixedProvider(vec![SearchResponse {
            query: "a".to_string(),
            results: vec![SearchResult { title: "T".to_string(), url: "https://x.com".to_string(), content: long_content }],
        }]);
        let output = run_web_search(&provider, &UppercaseSummarizer, 10, json!({"queries": ["a"]})).await.unwrap();
        assert!(output.contains(&"X".repeat(10)));
        assert!(!output.contains(&"X".repeat(11)));
    }

    #[tokio::test]
    async fn rejects_empty_query_list() {
        let provider = FixedProvider(vec![]);
        let result = run_web_search(&provider, &UppercaseSummarizer, 1000, json!({"queries": []})).await;
        assert!(result.is_err());
    }
}
