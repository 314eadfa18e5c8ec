// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde::Deserialize;

/// One hit returned by a search backend for a single query.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// The results for one query, tagged with the query that produced them so
/// callers can trace a result back to its originating search.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

/// A backend capable of running web searches. Implementations own their own
/// transport and per-query error handling: a failed query degrades to an
/// empty result set rather than aborting the whole batch, since one bad
/// query shouldn't sink a multi-query search round.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> SearchResponse;

    async fn search_many(&self, queries: &[String], max_results: usize) -> Vec<SearchResponse> {
        let futures = queries.iter().map(|q| self.search(q, max_results));
        futures::future::join_all(futures).await
    }
}

/// Queries a local SearXNG metasearch instance's JSON API.
pub struct SearxngProvider {
    base_url: String,
    client: reqwest::Client,
}

impl SearxngProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), client: reqwest::Client::new() }
    }
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[async_trait]
impl SearchProvider for SearxngProvider {
    async fn search(&self, query: &str, max_results: usize) -> SearchResponse {
        let url = format!("{}/search", self.base_url);
        let outcome = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("pageno", "1")])
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await;

        let results = match outcome {
            Ok(resp) if resp.status().is_success() => match resp.json::<SearxngResponse>().await {
                Ok(body) => body.results,
                Err(e) => {
                    tracing::warn!(query, error = %e, "searxng response was not valid JSON");
                    Vec::new()
                }
            },
            Ok(resp) => {
                tracing::warn!(query, status = %resp.status(), "searxng search returned non-success status");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "searxng search request failed");
                Vec::new()
            }
        };

        SearchResponse { query: query.to_string(), results: results.into_iter().take(max_results).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider(Vec<SearchResult>);

    #[async_trait]
    impl SearchProvider for StaticProvider {
        async fn search(&self, query: &str, max_results: usize) -> SearchResponse {
            SearchResponse { query: query.to_string(), results: self.0.iter().take(max_results).cloned().collect() }
        }
    }

    #[tokio::test]
    async fn search_many_runs_each_query() {
        let provider = StaticProvider(vec![SearchResult {
            title: "t".into(),
            url: "https://example.com".into(),
            content: "c".into(),
        }]);
        let responses = provider.search_many(&["a".to_string(), "b".to_string()], 5).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].query, "a");
        assert_eq!(responses[1].query, "b");
    }

    #[tokio::test]
    async fn search_respects_max_results() {
        let provider = StaticProvider(vec![
            SearchResult { title: "1".into(), url: "https://a.com".into(), content: String::new() },
            SearchResult { title: "2".into(), url: "https://b.com".into(), content: String::new() },
        ]);
        let response = provider.search("q", 1).await;
        assert_eq!(response.results.len(), 1);
    }
}
