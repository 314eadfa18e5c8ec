// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use crate::{ToolCall, ToolDescriptor, ToolResult};

/// A tool's name, description, and input schema — mirrors
/// `research_model::ToolSchema` but keeps this crate independent of the
/// model crate's wire types.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Central registry holding all tools available to an agent.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<ToolDescriptor>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(&mut self, tool: ToolDescriptor) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Register a tool that is already shared via `Arc`, e.g. one built by
    /// an extension-tool loader that hands out the same descriptor to
    /// multiple registries.
    pub fn register_arc(&mut self, tool: Arc<ToolDescriptor>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolDescriptor>> {
        self.tools.get(name).cloned()
    }

    /// Schemas for every registered tool, sorted by name. `Native` tools
    /// are excluded since they have no schema for this engine to advertise —
    /// the model provider already knows about them.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .filter_map(|t| {
                t.schema().map(|schema| ToolSchema {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: schema.clone(),
                })
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Execute a tool call, dispatching to the registered descriptor. If
    /// `call.name` isn't registered, the error lists the tools that are, so
    /// the model has a chance to self-correct on the next turn.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        match self.tools.get(&call.name) {
            Some(tool) => tool.execute(call).await,
            None => ToolResult::err(
                &call.id,
                format!("unknown tool: \"{}\". available tools: {}", call.name, self.names().join(", ")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::Callable {
            name: name.to_string(),
            description: "echoes its input".to_string(),
            schema: json!({"type": "object"}),
            handler: std::sync::Arc::new(|args: serde_json::Value| async move { Ok(format!("echo:{args}")) }),
        }
    }

    #[test]
    fn register_and_get() {
        let mut reg = ToolRegistry::new();
        reg.register(echo_tool("echo"));
        assert!(reg.get("echo").is_some());
    }

    #[test]
    fn get_unknown_returns_none() {
        let reg = ToolRegistry::new();
        assert!(reg.get("nope").is_none());
    }

    #[test]
    fn names_returns_all_registered_sorted() {
        let mut reg = ToolRegistry::new();
        reg.register(echo_tool("b"));
        reg.register(echo_tool("a"));
        assert_eq!(reg.names(), vec!["a", "b"]);
    }

    #[test]
    fn schemas_contains_registered_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(echo_tool("my_tool"));
        let schemas = reg.schemas();
        assert!(schemas.iter().any(|s| s.name == "my_tool"));
    }

    #[test]
    fn schemas_exclude_native_tools() {
        let mut reg = ToolRegistry::new();
        reg.register(ToolDescriptor::Native { name: "native_search".into(), description: "".into() });
        assert!(reg.schemas().is_empty());
    }

    #[tokio::test]
    async fn execute_known_tool_succeeds() {
        let mut reg = ToolRegistry::new();
        reg.register(echo_tool("echo"));
        let call = ToolCall { id: "1".into(), name: "echo".into(), args: json!({"x": 1}) };
        let out = reg.execute(&call).await;
        assert!(!out.is_error);
        assert!(out.content.starts_with("echo:"));
    }

    #[tokio::test]
    async fn execute_unknown_tool_lists_available_names() {
        let mut reg = ToolRegistry::new();
        reg.register(echo_tool("echo"));
        reg.register(echo_tool("search"));
        let call = ToolCall { id: "x".into(), name: "missing".into(), args: json!({}) };
        let out = reg.execute(&call).await;
        assert!(out.is_error);
        assert!(out.content.contains("unknown tool"));
        assert!(out.content.contains("echo"));
        assert!(out.content.contains("search"));
    }

    #[test]
    fn registering_same_name_twice_overwrites() {
        let mut reg = ToolRegistry::new();
        reg.register(echo_tool("t"));
        reg.register(echo_tool("t"));
        assert_eq!(reg.names().len(), 1);
    }
}
