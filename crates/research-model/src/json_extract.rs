// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//
// Extraction of a JSON object embedded in free-form model text, for models
// without native structured output. Strips fenced code blocks, then scans
// for the first balanced `{...}` span.

/// Strip a leading/trailing fenced code block (` ```json ` or generic ` ``` `)
/// if present, returning the inner text unchanged otherwise.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.trim().strip_suffix("```").map(str::trim).unwrap_or(rest.trim())
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.trim().strip_suffix("```").map(str::trim).unwrap_or(rest.trim())
    } else {
        trimmed
    }
}

/// Extract the first balanced `{...}` object from `text`, honoring string
/// literals and escape sequences so braces inside quoted strings don't
/// confuse the depth count.
pub fn extract_balanced_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
