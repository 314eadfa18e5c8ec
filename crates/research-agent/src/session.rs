// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use research_model::Message;
use uuid::Uuid;

/// In-memory transcript for a single [`crate::agent::ToolLoopAgent`] run.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub token_count: usize,
}

impl Session {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4().to_string(), messages: Vec::new(), token_count: 0 }
    }

    pub fn push(&mut self, msg: Message) {
        self.token_count += msg.approx_tokens();
        self.messages.push(msg);
    }

    pub fn push_many(&mut self, msgs: impl IntoIterator<Item = Message>) {
        for m in msgs {
            self.push(m);
        }
    }

    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.recalculate_tokens();
    }

    pub fn recalculate_tokens(&mut self) {
        self.token_count = self.messages.iter().map(Message::approx_tokens).sum();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
