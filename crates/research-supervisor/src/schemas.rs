// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! JSON Schemas and plain-data types for the Supervisor's structured calls.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClarificationDecision {
    pub needs_clarification: bool,
    #[serde(default)]
    pub question: String,
}

pub fn clarification_schema() -> Value {
    json!({
        "type": "object",
        "required": ["needs_clarification"],
        "properties": {
            "needs_clarification": {"type": "boolean"},
            "question": {"type": "string", "description": "the clarifying question to ask, if needed"}
        }
    })
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BriefResult {
    pub brief: String,
}

pub fn brief_schema() -> Value {
    json!({
        "type": "object",
        "required": ["brief"],
        "properties": {
            "brief": {"type": "string", "description": "the canonicalized research question"}
        }
    })
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlanResult {
    pub subtasks: Vec<String>,
}

pub fn plan_schema() -> Value {
    json!({
        "type": "object",
        "required": ["subtasks"],
        "properties": {
            "subtasks": {
                "type": "array",
                "items": {"type": "string"},
                "description": "one focused research brief per sub-agent"
            }
        }
    })
}

/// The compression phase's output: findings condensed to bullets plus any
/// gaps still open, which gate further replanning rounds.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct CompressedNotes {
    pub bullet_findings: Vec<String>,
    pub open_gaps: Vec<String>,
}

pub fn compression_schema() -> Value {
    json!({
        "type": "object",
        "required": ["bullet_findings", "open_gaps"],
        "properties": {
            "bullet_findings": {"type": "array", "items": {"type": "string"}},
            "open_gaps": {
                "type": "array",
                "items": {"type": "string"},
                "description": "unresolved questions that warrant another planning round; empty if none"
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_notes_defaults_to_empty() {
        let c = CompressedNotes::default();
        assert!(c.bullet_findings.is_empty());
        assert!(c.open_gaps.is_empty());
    }
}
