// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//
// Schema-only control-flow signal: a research agent calls this to declare
// its sub-task finished. There is no handler — the agent loop watches for
// the call by name and terminates on it; `ToolDescriptor::execute` just
// validates and echoes the arguments back.
use serde_json::json;

use crate::ToolDescriptor;

pub const RESEARCH_COMPLETE: &str = "research_complete";

pub fn research_complete_tool() -> ToolDescriptor {
    ToolDescriptor::Schema {
        name: RESEARCH_COMPLETE.to_string(),
        description: "Call this when you have gathered enough information to fully answer \
            the assigned research question. Do not call it until you are confident no \
            further tool calls would improve the answer."
            .to_string(),
        schema: json!({
            "type": "object",
            "required": [],
            "properties": {}
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolCall;

    #[tokio::test]
    async fn executes_with_no_arguments() {
        let tool = research_complete_tool();
        let call = ToolCall { id: "test".into(), name: RESEARCH_COMPLETE.into(), args: json!({}) };
        let result = tool.execute(&call).await;
        assert!(!result.is_error);
    }

    #[test]
    fn name_matches_constant() {
        assert_eq!(research_complete_tool().name(), RESEARCH_COMPLETE);
    }
}
