// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, RuntimeConfig, SearchApi};

/// Conventional config file locations, checked in order when no explicit
/// path is supplied. The first one found is used.
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("research.toml");
    if local.is_file() {
        return Some(local);
    }
    if let Some(cfg_dir) = dirs::config_dir() {
        let xdg = cfg_dir.join("research/config.toml");
        if xdg.is_file() {
            return Some(xdg);
        }
    }
    None
}

/// Load a [`RuntimeConfig`] by layering, lowest to highest precedence:
/// compiled-in defaults, an optional TOML file, then environment variables.
///
/// A missing optional file (no `path` given, and no conventional file
/// found) is not an error — defaults are used. A file that exists but
/// fails to parse is a hard [`ConfigError`].
pub fn load(path: Option<&Path>) -> Result<RuntimeConfig, ConfigError> {
    let file_path = path.map(PathBuf::from).or_else(default_config_path);

    let mut config = match file_path {
        Some(p) => {
            debug!(path = %p.display(), "loading config file");
            let text = std::fs::read_to_string(&p).map_err(|source| ConfigError::Read {
                path: p.clone(),
                source,
            })?;
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path: p, source })?
        }
        None => RuntimeConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut RuntimeConfig) {
    if let Ok(v) = std::env::var("RESEARCH_MODEL") {
        config.research_model = v;
    }
    if let Ok(v) = std::env::var("SUMMARIZATION_MODEL") {
        config.summarization_model = v;
    }
    if let Ok(v) = std::env::var("COMPRESSION_MODEL") {
        config.compression_model = v;
    }
    if let Ok(v) = std::env::var("FINAL_REPORT_MODEL") {
        config.final_report_model = v;
    }
    if let Ok(v) = std::env::var("SEARXNG_URL") {
        config.searxng_url = Some(v);
    }
    if let Ok(v) = std::env::var("SEARCH_API") {
        if let Some(api) = parse_search_api(&v) {
            config.search_api = api;
        }
    }
    if let Ok(v) = std::env::var("MAX_CONCURRENT_RESEARCH_UNITS") {
        if let Ok(n) = v.parse() {
            config.max_concurrent_research_units = n;
        }
    }
    if let Ok(v) = std::env::var("MAX_ITERATIONS") {
        if let Ok(n) = v.parse() {
            config.max_iterations = n;
        }
    }
    if let Ok(v) = std::env::var("MAX_REPLANNING_ROUNDS") {
        if let Ok(n) = v.parse() {
            config.max_replanning_rounds = n;
        }
    }
    if let Ok(v) = std::env::var("ALLOW_CLARIFICATION") {
        if let Ok(b) = v.parse() {
            config.allow_clarification = b;
        }
    }
    if let Ok(v) = std::env::var("GET_API_KEYS_FROM_CONFIG") {
        if let Ok(b) = v.parse() {
            config.get_api_keys_from_config = b;
        }
    }
}

fn parse_search_api(s: &str) -> Option<SearchApi> {
    match s.to_ascii_lowercase().as_str() {
        "tavily" => Some(SearchApi::Tavily),
        "searxng" => Some(SearchApi::Searxng),
        "anthropic" => Some(SearchApi::Anthropic),
        "openai" => Some(SearchApi::Openai),
        "none" => Some(SearchApi::None),
        _ => None,
    }
}
