// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use research_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("the run was cancelled")]
    Cancelled,

    #[error("extension-tool authentication required: {message} ({url})")]
    AuthenticationRequired { message: String, url: String },

    #[error("mcp token exchange failed: {0}")]
    McpTokenExchange(String),
}
