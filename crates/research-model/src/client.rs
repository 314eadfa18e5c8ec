// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::{CompletionRequest, ResponseEvent};

pub type ResponseStream = Pin<Box<dyn Stream<Item = anyhow::Result<ResponseEvent>> + Send>>;

/// The pluggable model transport this engine is built on top of.
///
/// A concrete implementation talks to one model-provider's wire protocol;
/// this crate ships only [`crate::MockModelClient`] and
/// [`crate::ScriptedMockModelClient`] for tests. Production implementations
/// (OpenAI, Anthropic, Google, ...) are an external collaborator.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Model identifier as configured, e.g. `"openai:gpt-4o"`. Used by
    /// [`crate::ModelAdapter`] for provider-prefix classification.
    fn model_name(&self) -> &str;

    /// Send a completion request and return a streaming response.
    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream>;
}
