// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! End-to-end tests driving the full clarify/brief/plan/dispatch/compress/
//! report pipeline through [`deep_research::Supervisor`] with scripted
//! mock model clients — no network access.
use std::sync::Arc;

use async_trait::async_trait;
use deep_research::{
    CancellationToken, CompressedNotes, CredentialStore, InMemoryCredentialStore, Message,
    ModelAdapter, ModelClient, RuntimeConfig, SearchApi, SearchProvider, Summarizer, Supervisor,
    SupervisorDeps, SupervisorOutcome,
};
use research_model::{MockModelClient, ResponseEvent, ScriptedMockModelClient};
use research_search::{SearchResponse, SearchResult};
use serde_json::json;

struct StaticProvider(Vec<SearchResult>);

#[async_trait]
impl SearchProvider for StaticProvider {
    async fn search(&self, query: &str, max_results: usize) -> SearchResponse {
        SearchResponse { query: query.to_string(), results: self.0.iter().take(max_results).cloned().collect() }
    }
}

struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, content: &str) -> String {
        content.to_string()
    }
}

fn config(max_concurrent: usize, max_replanning_rounds: usize) -> Arc<RuntimeConfig> {
    Arc::new(RuntimeConfig {
        search_api: SearchApi::None,
        allow_clarification: false,
        max_concurrent_research_units: max_concurrent,
        max_iterations: 4,
        max_tool_calls: 8,
        max_replanning_rounds,
        ..Default::default()
    })
}

fn deps(
    research_client: Arc<dyn ModelClient>,
    compression_client: Arc<dyn ModelClient>,
    report_client: Arc<dyn ModelClient>,
) -> SupervisorDeps {
    SupervisorDeps {
        research_adapter: Arc::new(ModelAdapter::new(research_client, 1)),
        compression_adapter: Arc::new(ModelAdapter::new(compression_client, 1)),
        report_adapter: Arc::new(ModelAdapter::new(report_client, 1)),
        search_provider: Arc::new(StaticProvider(vec![])),
        summarizer: Arc::new(EchoSummarizer),
        credentials: Arc::new(InMemoryCredentialStore::new()) as Arc<dyn CredentialStore>,
    }
}

fn research_complete_turn() -> Vec<ResponseEvent> {
    vec![
        ResponseEvent::TextDelta(
            "Thought: enough information gathered\nAction: research_complete\nAction Input: {}".to_string(),
        ),
        ResponseEvent::Done,
    ]
}

// A single, unambiguous query goes straight from brief through one
// planning round to a finished Markdown report.
#[tokio::test]
async fn single_query_happy_path_produces_report() {
    let research_client = Arc::new(ScriptedMockModelClient::new(vec![
        vec![
            ResponseEvent::TextDelta(json!({"brief": "What is the CAP theorem?"}).to_string()),
            ResponseEvent::Done,
        ],
        vec![
            ResponseEvent::TextDelta(json!({"subtasks": ["Explain the CAP theorem"]}).to_string()),
            ResponseEvent::Done,
        ],
        research_complete_turn(),
    ]));
    let compression_client = Arc::new(ScriptedMockModelClient::always_text(
        json!({"bullet_findings": ["CAP trades consistency, availability, partition tolerance"], "open_gaps": []})
            .to_string(),
    ));
    let report_client = Arc::new(ScriptedMockModelClient::always_text("# Report\n\nThe CAP theorem..."));

    let supervisor = Supervisor::new(config(2, 1), deps(research_client, compression_client, report_client));
    let outcome = supervisor
        .run(vec![Message::user("What is the CAP theorem?")], CancellationToken::new())
        .await;

    match outcome {
        SupervisorOutcome::Report(text) => assert!(text.contains("CAP theorem")),
        other => panic!("expected a report, got {other:?}"),
    }
}

// When `allow_clarification` is set and the model judges the request
// ambiguous, the run halts with a question instead of proceeding to
// planning.
#[tokio::test]
async fn ambiguous_query_halts_for_clarification() {
    let research_client = Arc::new(ScriptedMockModelClient::always_text(
        json!({"needs_clarification": true, "question": "Which database system?"}).to_string(),
    ));
    let compression_client = Arc::new(ScriptedMockModelClient::always_text("{}"));
    let report_client = Arc::new(ScriptedMockModelClient::always_text(""));

    let mut cfg = (*config(2, 1)).clone();
    cfg.allow_clarification = true;
    let supervisor = Supervisor::new(Arc::new(cfg), deps(research_client, compression_client, report_client));
    let outcome =
        supervisor.run(vec![Message::user("how does replication work")], CancellationToken::new()).await;

    match outcome {
        SupervisorOutcome::ClarificationNeeded(q) => assert_eq!(q, "Which database system?"),
        other => panic!("expected clarification, got {other:?}"),
    }
}

// Replanning stops the round it first sees an empty `open_gaps`, even
// when `max_replanning_rounds` would allow more.
#[tokio::test]
async fn replanning_stops_as_soon_as_gaps_close() {
    let research_client = Arc::new(ScriptedMockModelClient::new(vec![
        vec![ResponseEvent::TextDelta(json!({"brief": "Compare SQL and NoSQL"}).to_string()), ResponseEvent::Done],
        vec![
            ResponseEvent::TextDelta(json!({"subtasks": ["Research SQL", "Research NoSQL"]}).to_string()),
            ResponseEvent::Done,
        ],
        research_complete_turn(),
        research_complete_turn(),
    ]));
    // First compression round reports a gap; if a second planning round
    // were reached, the research client's scripts would be exhausted and
    // it would fall back to "[no more scripts]" text, which would not
    // parse as a valid PlanResult and would end the run with an error
    // outcome instead of a report — so success here proves the loop
    // stopped after round 1.
    let compression_client = Arc::new(ScriptedMockModelClient::always_text(
        json!({"bullet_findings": ["SQL is relational"], "open_gaps": []}).to_string(),
    ));
    let report_client = Arc::new(ScriptedMockModelClient::always_text("# Report\n\nSQL vs NoSQL..."));

    let supervisor = Supervisor::new(config(2, 3), deps(research_client, compression_client, report_client));
    let outcome =
        supervisor.run(vec![Message::user("Compare SQL and NoSQL")], CancellationToken::new()).await;

    assert!(matches!(outcome, SupervisorOutcome::Report(_)));
}

// A cancellation token observed before the run starts short-circuits
// every phase; no model call is ever made.
#[tokio::test]
async fn cancellation_short_circuits_before_any_model_call() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let client: Arc<dyn ModelClient> = Arc::new(MockModelClient);
    let supervisor = Supervisor::new(config(2, 1), deps(client.clone(), client.clone(), client));
    let outcome = supervisor.run(vec![Message::user("anything")], cancel).await;
    assert!(matches!(outcome, SupervisorOutcome::Error(_)));
}

// A report-synthesis failure degrades to a partial report rather than
// losing the gathered findings.
#[tokio::test]
async fn report_synthesis_failure_falls_back_to_partial_report() {
    let research_client = Arc::new(ScriptedMockModelClient::new(vec![
        vec![ResponseEvent::TextDelta(json!({"brief": "Summarize TCP handshakes"}).to_string()), ResponseEvent::Done],
        vec![ResponseEvent::TextDelta(json!({"subtasks": ["Describe the three-way handshake"]}).to_string()), ResponseEvent::Done],
        research_complete_turn(),
    ]));
    let compression_client = Arc::new(ScriptedMockModelClient::always_text(
        json!({"bullet_findings": ["SYN, SYN-ACK, ACK"], "open_gaps": []}).to_string(),
    ));
    let report_client = Arc::new(ScriptedMockModelClient::always_text(""));

    let supervisor = Supervisor::new(config(2, 1), deps(research_client, compression_client, report_client));
    let outcome =
        supervisor.run(vec![Message::user("Summarize TCP handshakes")], CancellationToken::new()).await;

    match outcome {
        SupervisorOutcome::Report(text) => {
            assert!(text.starts_with("# Partial Report"));
            assert!(text.contains("SYN, SYN-ACK, ACK"));
        }
        other => panic!("expected a partial report, got {other:?}"),
    }
}

#[test]
fn compressed_notes_round_trips_through_json() {
    let notes = CompressedNotes {
        bullet_findings: vec!["a".to_string(), "b".to_string()],
        open_gaps: vec!["c".to_string()],
    };
    let value = serde_json::to_value(&notes).unwrap();
    let decoded: CompressedNotes = serde_json::from_value(value).unwrap();
    assert_eq!(decoded.bullet_findings, notes.bullet_findings);
    assert_eq!(decoded.open_gaps, notes.open_gaps);
}
