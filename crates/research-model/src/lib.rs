// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
pub mod adapter;
pub mod client;
mod error;
mod json_extract;
mod mock;
mod schema_validate;
mod text_mode;
mod types;

pub use adapter::{AssistantTurn, ModelAdapter, ToolCallRequest};
pub use client::ModelClient;
pub use error::ModelError;
pub use json_extract::{extract_balanced_json_object, strip_code_fences};
pub use mock::{MockModelClient, ScriptedMockModelClient};
pub use schema_validate::validate as validate_against;
pub use text_mode::{TextModeToolProtocol, ToolAction};
pub use types::*;
