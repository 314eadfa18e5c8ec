// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

/// A single tool invocation requested by a model.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Opaque identifier returned by the model (forwarded verbatim).
    pub id: String,
    pub name: String,
    pub args: Value,
}

/// The outcome of executing a [`ToolCall`].
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { call_id: call_id.into(), content: content.into(), is_error: false }
    }

    pub fn err(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { call_id: call_id.into(), content: content.into(), is_error: true }
    }
}

pub type CallableFuture = Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send>>;

/// A handler backing a [`ToolDescriptor::Callable`] tool.
pub trait CallableHandler: Send + Sync {
    fn call(&self, args: Value) -> CallableFuture;
}

impl<F, Fut> CallableHandler for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    fn call(&self, args: Value) -> CallableFuture {
        Box::pin((self)(args))
    }
}

/// A closed, tagged sum of the three tool shapes this engine recognizes.
///
/// Replaces a single always-callable trait with an explicit tag dispatched
/// on in [`ToolDescriptor::execute`]: whether a tool can even be invoked
/// directly is a property of its kind, not something every implementation
/// should have to re-decide.
pub enum ToolDescriptor {
    /// An opaque handle the model provider recognizes natively (e.g. a
    /// provider's built-in web-search tool). Not directly invocable here.
    Native { name: String, description: String },
    /// A named record type with a field schema. Executing it validates the
    /// input against the schema and echoes it back — used for control-flow
    /// signals like `ResearchComplete`, where the "result" is just the
    /// validated arguments themselves.
    Schema { name: String, description: String, schema: Value },
    /// A handler function invoked with the call's arguments.
    Callable { name: String, description: String, schema: Value, handler: Arc<dyn CallableHandler> },
}

impl ToolDescriptor {
    pub fn name(&self) -> &str {
        match self {
            ToolDescriptor::Native { name, .. } => name,
            ToolDescriptor::Schema { name, .. } => name,
            ToolDescriptor::Callable { name, .. } => name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ToolDescriptor::Native { description, .. } => description,
            ToolDescriptor::Schema { description, .. } => description,
            ToolDescriptor::Callable { description, .. } => description,
        }
    }

    /// The JSON Schema of this tool's input, if it has one. `Native` tools
    /// have none — the provider owns their shape.
    pub fn schema(&self) -> Option<&Value> {
        match self {
            ToolDescriptor::Native { .. } => None,
            ToolDescriptor::Schema { schema, .. } => Some(schema),
            ToolDescriptor::Callable { schema, .. } => Some(schema),
        }
    }

    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        match self {
            ToolDescriptor::Native { name, .. } => ToolResult::err(
                &call.id,
                format!("tool \"{name}\" requires provider-level support and cannot be executed directly"),
            ),
            ToolDescriptor::Schema { schema, .. } => {
                let errors = research_model::validate_against(&call.args, schema);
                if errors.is_empty() {
                    ToolResult::ok(&call.id, call.args.to_string())
                } else {
                    ToolResult::err(&call.id, format!("invalid input: {}", errors.join("; ")))
                }
            }
            ToolDescriptor::Callable { handler, .. } => match handler.call(call.args.clone()).await {
                Ok(text) => ToolResult::ok(&call.id, text),
                Err(e) => ToolResult::err(&call.id, e.to_string()),
            },
        }
    }
}
