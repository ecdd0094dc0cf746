use std::sync::Arc;

use crate::core::config::PipelineSettings;
use crate::core::errors::PipelineError;
use crate::llm::{ChatMessage, CompletionProvider, CompletionRequest};

use super::aggregate::SubjectGroup;
use super::types::{NO_CONTENT, NO_SOURCE, NO_TITLE};

pub const SNIPPET_INSTRUCTION: &str =
    "Enhance the following text to make it more engaging and informative to astronauts and space enthusiasts.:";

const GROUNDED_PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// The language-model step: turns retrieved raw text into fluent prose.
pub struct Synthesizer {
    completions: Arc<dyn CompletionProvider>,
    temperature: f64,
    snippet_max_tokens: u32,
}

impl Synthesizer {
    pub fn new(completions: Arc<dyn CompletionProvider>, pipeline: &PipelineSettings) -> Self {
        Self {
            completions,
            temperature: pipeline.temperature,
            snippet_max_tokens: pipeline.snippet_max_tokens,
        }
    }

    /// Per-snippet enhancement. Never fails: on any provider error (or an
    /// empty completion) the raw text is returned unchanged, so a failed
    /// enhancement still yields usable output.
    pub async fn synthesize_snippet(&self, raw_text: &str) -> String {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: SNIPPET_INSTRUCTION.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: raw_text.to_string(),
            },
        ];
        let mut request = CompletionRequest::new(messages);
        request.temperature = Some(self.temperature);
        request.max_tokens = Some(self.snippet_max_tokens);

        match self.completions.complete(request).await {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    tracing::warn!("snippet enhancement returned empty text, keeping raw snippet");
                    return raw_text.to_string();
                }
                trimmed.to_string()
            }
            Err(err) => {
                tracing::warn!("snippet enhancement failed, keeping raw snippet: {}", err);
                raw_text.to_string()
            }
        }
    }

    /// Grounded answer over the full retrieved context. There is no fallback
    /// text in this mode, so provider failures propagate to the caller, and
    /// an empty completion counts as a failure.
    pub async fn synthesize_answer(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, PipelineError> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: GROUNDED_PREAMBLE.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: format!("Context:\n{}\n\nQuestion: {}", context, question),
            },
        ];

        let mut request = CompletionRequest::new(messages);
        request.temperature = Some(self.temperature);
        let answer = self.completions.complete(request).await?;
        if answer.trim().is_empty() {
            return Err(PipelineError::Synthesis(
                "provider returned empty completion".to_string(),
            ));
        }
        Ok(answer)
    }
}

/// Raw text for one subject group, the input to snippet enhancement. A
/// single-entry group renders exactly as
/// `About {moon}: {title}. {content} Source: {source}`; additional entries
/// continue the sentence chain under the same subject prefix.
pub fn snippet_source_text(group: &SubjectGroup) -> String {
    let mut text = format!("About {}: ", group.subject);
    let rendered: Vec<String> = group
        .entries
        .iter()
        .map(|entry| {
            format!(
                "{}. {} Source: {}",
                entry.title.as_deref().unwrap_or(NO_TITLE),
                entry.content.as_deref().unwrap_or(NO_CONTENT),
                entry
                    .source_url
                    .as_deref()
                    .unwrap_or(NO_SOURCE),
            )
        })
        .collect();
    text.push_str(&rendered.join(" "));
    text
}

/// Full retrieved context for grounded synthesis: each entry rendered as
/// `{subject}: {title} - {content}`, entries joined by a blank line.
pub fn render_context(groups: &[SubjectGroup]) -> String {
    let mut chunks = Vec::new();
    for group in groups {
        for entry in &group.entries {
            chunks.push(format!(
                "{}: {} - {}",
                group.subject,
                entry.title.as_deref().unwrap_or(NO_TITLE),
                entry.content.as_deref().unwrap_or(NO_CONTENT),
            ));
        }
    }
    chunks.join("\n\n")
}

/// Bullet rendering of the raw matches, used when synthesis is disabled.
pub fn render_bullets(groups: &[SubjectGroup]) -> String {
    let mut body = String::new();
    for group in groups {
        for entry in &group.entries {
            body.push_str(&format!(
                "• About {}: {}\n{}\nSource: {}\n\n",
                group.subject,
                entry.title.as_deref().unwrap_or(NO_TITLE),
                entry.content.as_deref().unwrap_or(NO_CONTENT),
                entry
                    .source_url
                    .as_deref()
                    .unwrap_or(NO_SOURCE),
            ));
        }
    }
    body
}
