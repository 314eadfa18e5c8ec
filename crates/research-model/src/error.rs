// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("token limit exceeded and transcript truncation did not recover")]
    TokenLimitExceeded,
    #[error("structured output invalid after retries: {0}")]
    StructuredOutputInvalid(String),
    #[error("model transport error: {0}")]
    Transport(String),
}
