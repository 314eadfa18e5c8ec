// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Final report synthesis from a research brief and the compressed notes.

use research_model::{Message, ModelAdapter, ModelError};

use crate::schemas::CompressedNotes;

/// Combines the brief and compressed notes into a Markdown report via a
/// single model call. On a token-limit error, the truncate-and-retry-once
/// contract inherited transitively through [`ModelAdapter::invoke_text`]
/// kicks in first; if the call still fails, falls back to a partial-report
/// document rather than failing the whole run.
pub struct ReportWriter {
    adapter: std::sync::Arc<ModelAdapter>,
}

impl ReportWriter {
    pub fn new(adapter: std::sync::Arc<ModelAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn write(&self, brief: &str, notes: &CompressedNotes) -> String {
        let findings = if notes.bullet_findings.is_empty() {
            "(no findings were gathered)".to_string()
        } else {
            notes.bullet_findings.iter().map(|f| format!("- {f}")).collect::<Vec<_>>().join("\n")
        };

        let prompt = format!(
            "Write a Markdown research report answering the brief below, using only the \
             provided findings. Cite findings inline where relevant; do not invent facts \
             beyond what the findings support.\n\n\
             Brief:\n{brief}\n\nFindings:\n{findings}"
        );

        match self.adapter.invoke_text(vec![Message::user(prompt)]).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => partial_report(brief, notes, "the model returned an empty report"),
            Err(ModelError::TokenLimitExceeded) => {
                partial_report(brief, notes, "the notes could not fit within the model's context window")
            }
            Err(e) => partial_report(brief, notes, &e.to_string()),
        }
    }
}

fn partial_report(brief: &str, notes: &CompressedNotes, reason: &str) -> String {
    let excerpt: Vec<&String> = notes.bullet_findings.iter().take(10).collect();
    let excerpt_text = if excerpt.is_empty() {
        "(no findings were gathered)".to_string()
    } else {
        excerpt.iter().map(|f| format!("- {f}")).collect::<Vec<_>>().join("\n")
    };
    format!(
        "# Partial Report\n\n\
         Report synthesis failed: {reason}.\n\n\
         ## Brief\n\n{brief}\n\n\
         ## Findings gathered so far\n\n{excerpt_text}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_model::ScriptedMockModelClient;
    use std::sync::Arc;

    fn notes() -> CompressedNotes {
        CompressedNotes {
            bullet_findings: vec!["Merkle trees hash leaves pairwise".to_string()],
            open_gaps: vec![],
        }
    }

    #[tokio::test]
    async fn writes_report_from_model_reply() {
        let client = Arc::new(ScriptedMockModelClient::always_text("# Report\n\nMerkle trees..."));
        let writer = ReportWriter::new(Arc::new(ModelAdapter::new(client, 1)));
        let report = writer.write("What is a Merkle tree?", &notes()).await;
        assert!(report.contains("Merkle trees"));
    }

    #[tokio::test]
    async fn falls_back_to_partial_report_on_empty_reply() {
        let client = Arc::new(ScriptedMockModelClient::always_text(""));
        let writer = ReportWriter::new(Arc::new(ModelAdapter::new(client, 1)));
        let report = writer.write("brief", &notes()).await;
        assert!(report.starts_with("# Partial Report"));
        assert!(report.contains("Merkle trees hash leaves pairwise"));
    }
}
