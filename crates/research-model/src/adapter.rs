// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;

use crate::{
    json_extract::{extract_balanced_json_object, strip_code_fences},
    schema_validate,
    text_mode::{TextModeToolProtocol, ToolAction},
    CompletionRequest, FunctionCall, Message, ModelClient, ModelError, Role, ToolSchema, Usage,
};

/// Provider identifier prefixes recognised as supporting native tool-calling
/// and native structured output. Anything else falls back to text-mode
/// emulation — matching the fixed supported/unsupported lists this engine
/// ships with rather than a live capability probe.
const NATIVE_PREFIXES: &[&str] = &["openai:", "anthropic:", "google:", "gemini:"];
const TEXT_MODE_PREFIXES: &[&str] = &["ollama:", "together:", "groq:"];

/// Returns `true` when `model_id` is classified as supporting native
/// tool-calling / structured output, by prefix match alone.
pub fn is_native_provider(model_id: &str) -> bool {
    NATIVE_PREFIXES.iter().any(|p| model_id.starts_with(p))
}

/// `true` only for explicitly unsupported prefixes; unrecognised prefixes
/// default to the text-mode path, same as unsupported ones.
pub fn is_known_text_mode_provider(model_id: &str) -> bool {
    TEXT_MODE_PREFIXES.iter().any(|p| model_id.starts_with(p))
}

const TOKEN_LIMIT_MARKERS: &[&str] = &[
    "context_length_exceeded",
    "context length",
    "maximum context length",
    "too many tokens",
    "prompt is too long",
    "resource_exhausted",
    "token limit",
];

/// Inspect an error message for known provider token-limit phrasing.
pub fn is_token_limit_error(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    TOKEN_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Drop everything from (and including) the most recent assistant message.
/// Returns an empty vec if there is no assistant message to drop — callers
/// treat that as truncation exhaustion.
pub fn truncate_from_last_assistant(transcript: &[Message]) -> Vec<Message> {
    match transcript.iter().rposition(|m| m.role == Role::Assistant) {
        Some(idx) => transcript[..idx].to_vec(),
        None => Vec::new(),
    }
}

/// One requested tool invocation parsed out of an assistant turn.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// The result of [`ModelAdapter::invoke_with_tools`].
#[derive(Debug, Clone, Default)]
pub struct AssistantTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Usage,
}

/// Uniform contract over native-tool-calling and text-mode model families.
///
/// Wraps a [`ModelClient`] with retries, token-limit detection and
/// transcript truncation, and structured-output extraction for models that
/// lack a native mechanism.
pub struct ModelAdapter {
    client: Arc<dyn ModelClient>,
    max_retries: usize,
}

impl ModelAdapter {
    pub fn new(client: Arc<dyn ModelClient>, max_retries: usize) -> Self {
        Self { client, max_retries }
    }

    pub fn is_native(&self) -> bool {
        is_native_provider(self.client.model_name())
    }

    /// Plain chat call. See [`ModelAdapter::invoke_with_tools`] for the
    /// retry/truncation contract; this is just its text-only projection.
    pub async fn invoke_text(&self, messages: Vec<Message>) -> Result<String, ModelError> {
        let turn = self.invoke_with_tools(messages, vec![]).await?;
        Ok(turn.text.unwrap_or_default())
    }

    /// Call the model, exposing any tool-call payload.
    ///
    /// Native providers receive `tools` directly in the completion request.
    /// Text-mode providers never see a `tools` field on the wire: the tool
    /// list is rendered into a system message via [`TextModeToolProtocol`],
    /// the model is called as plain text, and the reply is parsed back into
    /// either a final answer or a single tool call.
    pub async fn invoke_with_tools(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolSchema>,
    ) -> Result<AssistantTurn, ModelError> {
        if tools.is_empty() || self.is_native() {
            self.invoke_with_tools_native(messages, tools).await
        } else {
            self.invoke_with_tools_text_mode(messages, tools).await
        }
    }

    async fn invoke_with_tools_text_mode(
        &self,
        mut messages: Vec<Message>,
        tools: Vec<ToolSchema>,
    ) -> Result<AssistantTurn, ModelError> {
        messages.push(Message::system(TextModeToolProtocol::render(&tools)));
        let turn = self.invoke_with_tools_native(messages, vec![]).await?;
        let text = turn.text.clone().unwrap_or_default();

        match TextModeToolProtocol::parse(&text) {
            ToolAction::FinalAnswer(answer) => {
                Ok(AssistantTurn { text: Some(answer), tool_calls: vec![], usage: turn.usage })
            }
            ToolAction::ToolCall { name, input } => {
                let arguments = TextModeToolProtocol::normalize(&name, input);
                Ok(AssistantTurn {
                    text: None,
                    tool_calls: vec![ToolCallRequest {
                        id: uuid::Uuid::new_v4().to_string(),
                        name,
                        arguments,
                    }],
                    usage: turn.usage,
                })
            }
            // Neither a tool call nor a final-answer marker: the caller treats
            // this as a terminal, tool-free turn.
            ToolAction::None => Ok(AssistantTurn { text: Some(text), tool_calls: vec![], usage: turn.usage }),
        }
    }

    async fn invoke_with_tools_native(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolSchema>,
    ) -> Result<AssistantTurn, ModelError> {
        let mut transcript = messages;
        let mut truncated_once = false;
        let mut retries_left = self.max_retries;

        loop {
            let req = CompletionRequest { messages: transcript.clone(), tools: tools.clone() };
            match self.run_completion(req).await {
                Ok(turn) => return Ok(turn),
                Err(e) => {
                    let msg = e.to_string();
                    if is_token_limit_error(&msg) {
                        if truncated_once {
                            return Err(ModelError::TokenLimitExceeded);
                        }
                        let truncated = truncate_from_last_assistant(&transcript);
                        if truncated.is_empty() {
                            return Err(ModelError::TokenLimitExceeded);
                        }
                        transcript = truncated;
                        truncated_once = true;
                        continue;
                    }
                    if retries_left == 0 {
                        return Err(ModelError::Transport(msg));
                    }
                    retries_left -= 1;
                }
            }
        }
    }

    /// Return a value validated against `schema`.
    ///
    /// Native providers are asked for the structured value via a forced
    /// single-tool call (`emit_result`, parameters = `schema`); everything
    /// else gets a JSON-emission instruction appended to the transcript,
    /// is invoked in text mode, and the first balanced JSON object in the
    /// reply is extracted and validated. Both paths retry with an
    /// error-feedback message on parse/validation failure, up to
    /// `max_structured_output_retries`.
    pub async fn invoke_structured(
        &self,
        messages: Vec<Message>,
        schema: &Value,
    ) -> Result<Value, ModelError> {
        if self.is_native() {
            self.invoke_structured_native(messages, schema).await
        } else {
            self.invoke_structured_text_mode(messages, schema).await
        }
    }

    async fn invoke_structured_native(
        &self,
        messages: Vec<Message>,
        schema: &Value,
    ) -> Result<Value, ModelError> {
        let tool = ToolSchema {
            name: "emit_result".to_string(),
            description: "Emit the final structured result.".to_string(),
            parameters: schema.clone(),
        };
        let mut retries_left = self.max_retries;
        let mut transcript = messages;
        loop {
            let turn = self.invoke_with_tools(transcript.clone(), vec![tool.clone()]).await?;
            let call = turn.tool_calls.iter().find(|c| c.name == "emit_result");
            match call {
                Some(c) => {
                    let errors = schema_validate::validate(&c.arguments, schema);
                    if errors.is_empty() {
                        return Ok(c.arguments.clone());
                    }
                    if retries_left == 0 {
                        return Err(ModelError::StructuredOutputInvalid(errors.join("; ")));
                    }
                    retries_left -= 1;
                    transcript.push(Message::user(format!(
                        "The previous result did not match the required schema: {}. Please retry.",
                        errors.join("; ")
                    )));
                }
                None => {
                    if retries_left == 0 {
                        return Err(ModelError::StructuredOutputInvalid(
                            "model did not call emit_result".to_string(),
                        ));
                    }
                    retries_left -= 1;
                    transcript.push(Message::user(
                        "Please call emit_result with the required fields.".to_string(),
                    ));
                }
            }
        }
    }

    async fn invoke_structured_text_mode(
        &self,
        messages: Vec<Message>,
        schema: &Value,
    ) -> Result<Value, ModelError> {
        let mut transcript = messages;
        transcript.push(Message::user(json_instruction(schema)));

        let mut retries_left = self.max_retries;
        loop {
            let text = self.invoke_text(transcript.clone()).await?;
            let stripped = strip_code_fences(&text);
            let candidate = extract_balanced_json_object(stripped).unwrap_or(stripped);
            match serde_json::from_str::<Value>(candidate) {
                Ok(value) => {
                    let errors = schema_validate::validate(&value, schema);
                    if errors.is_empty() {
                        return Ok(value);
                    }
                    if retries_left == 0 {
                        return Err(ModelError::StructuredOutputInvalid(errors.join("; ")));
                    }
                    retries_left -= 1;
                    transcript.push(Message::assistant(text));
                    transcript.push(Message::user(format!(
                        "That did not match the required schema: {}. Re-emit as a single JSON object.",
                        errors.join("; ")
                    )));
                }
                Err(e) => {
                    if retries_left == 0 {
                        return Err(ModelError::StructuredOutputInvalid(e.to_string()));
                    }
                    retries_left -= 1;
                    transcript.push(Message::assistant(text));
                    transcript.push(Message::user(format!(
                        "That was not valid JSON ({e}). Re-emit as a single JSON object."
                    )));
                }
            }
        }
    }

    async fn run_completion(&self, req: CompletionRequest) -> anyhow::Result<AssistantTurn> {
        let mut stream = self.client.complete(req).await?;
        let mut text = String::new();
        let mut tool_calls: Vec<ToolCallRequest> = Vec::new();
        let mut usage = Usage::default();

        while let Some(event) = stream.next().await {
            match event? {
                crate::ResponseEvent::TextDelta(delta) => text.push_str(&delta),
                crate::ResponseEvent::ToolCall { id, name, arguments } => {
                    let parsed = serde_json::from_str(&arguments).unwrap_or(Value::Object(Default::default()));
                    tool_calls.push(ToolCallRequest { id, name, arguments: parsed });
                }
                crate::ResponseEvent::Usage(u) => usage = u,
                crate::ResponseEvent::Done => break,
                crate::ResponseEvent::Error(msg) => anyhow::bail!(msg),
            }
        }

        Ok(AssistantTurn {
            text: if text.is_empty() { None } else { Some(text) },
            tool_calls,
            usage,
        })
    }
}

fn json_instruction(schema: &Value) -> String {
    let mut lines = vec![
        "Respond with a single JSON object matching this schema. Do not include any text outside the JSON object.".to_string(),
    ];
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            let ty = prop.get("type").and_then(Value::as_str).unwrap_or("any");
            let desc = prop.get("description").and_then(Value::as_str).unwrap_or("");
            lines.push(format!("- {name} ({ty}): {desc}"));
        }
    }
    lines.join("\n")
}

// Convenience re-export so callers can build a [`FunctionCall`] from a
// [`ToolCallRequest`] when bridging into message history.
impl From<&ToolCallRequest> for FunctionCall {
    fn from(req: &ToolCallRequest) -> Self {
        FunctionCall { name: req.name.clone(), arguments: req.arguments.to_string() }
    }
}
