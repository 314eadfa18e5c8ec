// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//
// Gives a model an explicit place to reason before acting, rather than
// burying it in a free-text preamble a text-mode parser would have to
// strip out. The handler's only effect is recording the reflection back
// into the transcript as a tool result.
use serde_json::json;
use std::sync::Arc;

use crate::ToolDescriptor;

pub const THINK: &str = "think";

pub fn think_tool() -> ToolDescriptor {
    ToolDescriptor::Callable {
        name: THINK.to_string(),
        description: "Use this to reason step by step about what to do next before calling \
            another tool. Does not affect the world; its only effect is recorded in the \
            transcript."
            .to_string(),
        schema: json!({
            "type": "object",
            "required": ["reflection"],
            "properties": {
                "reflection": {"type": "string"}
            }
        }),
        handler: Arc::new(|args: serde_json::Value| async move {
            let reflection = args
                .get("reflection")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            Ok(format!("Reflection recorded: {reflection}"))
        }),
    }
}
