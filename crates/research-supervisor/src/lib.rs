// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Top-level orchestration: the `Supervisor` state machine and the
//! collaborators it composes — tool-registry assembly, extension-tool
//! (MCP) loading, credential caching, and final report synthesis.

mod credentials;
mod error;
mod mcp;
mod registry;
mod report;
mod schemas;
mod supervisor;

pub use credentials::{CachedToken, CredentialStore, InMemoryCredentialStore};
pub use error::SupervisorError;
pub use mcp::{exchange_token, load_mcp_tools};
pub use registry::{build_research_tool_registry, research_model_adapter};
pub use report::ReportWriter;
pub use schemas::{
    brief_schema, clarification_schema, compression_schema, plan_schema, BriefResult,
    ClarificationDecision, CompressedNotes, PlanResult,
};
pub use supervisor::{ResearchNote, Supervisor, SupervisorDeps, SupervisorOutcome};
