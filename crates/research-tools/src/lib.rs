// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
pub mod builtin;
mod registry;
mod tool;

pub use builtin::research_complete::{research_complete_tool, RESEARCH_COMPLETE};
pub use builtin::think::{think_tool, THINK};
pub use registry::{ToolRegistry, ToolSchema};
pub use tool::{CallableFuture, CallableHandler, ToolCall, ToolDescriptor, ToolResult};
