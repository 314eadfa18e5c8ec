// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Render/parse/normalize strategy for models without native tool-calling.
//!
//! Isolated from [`crate::adapter::ModelAdapter`] so that native-tool-call
//! providers never instantiate it.

use serde_json::{json, Value};

use crate::json_extract::extract_balanced_json_object;
use crate::types::ToolSchema;

/// The three shapes a text-mode response can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    FinalAnswer(String),
    ToolCall { name: String, input: Value },
    None,
}

const THINK_ALIASES: &[&str] = &["prompt", "thought", "thinking", "question", "input", "content"];
const THINK_PLACEHOLDER: &str = "(no reflection provided)";

pub struct TextModeToolProtocol;

impl TextModeToolProtocol {
    /// Render a system message enumerating the available tools and the two
    /// response formats a text-mode model is expected to use.
    pub fn render(tools: &[ToolSchema]) -> String {
        let mut lines = vec![
            "You do not have native tool-calling. The following tools are available:".to_string(),
        ];
        for tool in tools {
            lines.push(format!("- {}: {}", tool.name, tool.description));
            if let Some(props) = tool.parameters.get("properties").and_then(Value::as_object) {
                let names: Vec<&str> = props.keys().map(String::as_str).collect();
                if !names.is_empty() {
                    lines.push(format!("  parameters: {}", names.join(", ")));
                }
            }
        }
        lines.push(
            "\nRespond with exactly one tool call per turn, using one of these two formats:\n\n\
             Thought: <your reasoning>\nAction: <tool name>\nAction Input: <JSON object>\n\n\
             or, once you have enough information:\n\n\
             Thought: <your reasoning>\nFinal Answer: <answer text>"
                .to_string(),
        );
        lines.join("\n")
    }

    /// Classify a model's free-text reply as a final answer, a tool call, or
    /// neither.
    pub fn parse(text: &str) -> ToolAction {
        if let Some(rest) = find_after_marker(text, "final answer:") {
            return ToolAction::FinalAnswer(rest.trim().to_string());
        }

        let action = find_after_marker(text, "action:");
        let action_input = find_after_marker(text, "action input:");
        match (action, action_input) {
            (Some(action_rest), Some(input_rest)) => {
                // `action_rest` starts right after "Action:" and may run on
                // to include the following "Action Input:" line; take only
                // the first non-empty line as the tool name.
                let name = action_rest
                    .lines()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("")
                    .trim()
                    .to_string();
                let body = input_rest.trim();
                let input = extract_balanced_json_object(body)
                    .and_then(|s| serde_json::from_str(s).ok())
                    .unwrap_or_else(|| json!({ "input": body }));
                ToolAction::ToolCall { name, input }
            }
            _ => ToolAction::None,
        }
    }

    /// Apply per-tool parameter aliasing before a text-mode tool call is
    /// dispatched to the registry.
    pub fn normalize(name: &str, input: Value) -> Value {
        if name == "think" {
            normalize_think(input)
        } else if name.contains("search") {
            normalize_search(input)
        } else {
            input
        }
    }
}

/// Case-insensitively find `marker` and return the text following it.
fn find_after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let lower = text.to_ascii_lowercase();
    let idx = lower.find(marker)?;
    Some(&text[idx + marker.len()..])
}

fn normalize_think(input: Value) -> Value {
    let obj = match input.as_object() {
        Some(o) => o,
        None => return json!({ "reflection": THINK_PLACEHOLDER }),
    };

    if let Some(v) = obj.get("reflection") {
        return json!({ "reflection": v.clone() });
    }
    for alias in THINK_ALIASES {
        if let Some(v) = obj.get(*alias) {
            return json!({ "reflection": v.clone() });
        }
    }
    if obj.len() == 1 {
        if let Some(v) = obj.values().next() {
            return json!({ "reflection": v.clone() });
        }
    }
    json!({ "reflection": THINK_PLACEHOLDER })
}

fn normalize_search(input: Value) -> Value {
    let mut obj = match input.as_object().cloned() {
        Some(o) => o,
        None => return input,
    };

    match obj.remove("queries") {
        Some(q) if q.is_array() => {
            obj.insert("queries".to_string(), q);
        }
        Some(scalar) => {
            obj.insert("queries".to_string(), json!([scalar]));
        }
        None => {
            if let Some(q) = obj.remove("query") {
                obj.insert("queries".to_string(), json!([q]));
            }
        }
    }
    Value::Object(obj)
}
