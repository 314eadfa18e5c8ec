// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Token cache for extension-tool (MCP) OAuth exchanges.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

/// A cached OAuth access token, evicted once it expires.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_in: u64,
    pub created_at: u64,
}

impl CachedToken {
    pub fn is_expired(&self, now: u64) -> bool {
        self.created_at + self.expires_in < now
    }
}

/// Narrow trait over a token cache, serializing concurrent writes from
/// multiple in-flight OAuth exchanges.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<CachedToken>;
    async fn put(&self, key: &str, token: CachedToken);
    async fn evict_expired(&self, now: u64);
}

/// `Mutex<HashMap<..>>`-backed in-memory implementation. Good enough to
/// exercise the token-exchange and env-var credential paths in a
/// single-process engine; a persistent store is an external collaborator.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tokens: Mutex<HashMap<String, CachedToken>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, key: &str) -> Option<CachedToken> {
        self.tokens.lock().unwrap().get(key).cloned()
    }

    async fn put(&self, key: &str, token: CachedToken) {
        self.tokens.lock().unwrap().insert(key.to_string(), token);
    }

    async fn evict_expired(&self, now: u64) {
        self.tokens.lock().unwrap().retain(|_, t| !t.is_expired(now));
    }
}
