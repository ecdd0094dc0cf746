use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::config::{PipelineSettings, SynthesisMode};
use crate::core::errors::PipelineError;

use super::aggregate::aggregate;
use super::retrieval::Retriever;
use super::synthesis::{render_bullets, render_context, snippet_source_text, Synthesizer};

pub const NO_MATCH_MESSAGE: &str = "I couldn't find any relevant information about that in my database. Try asking about specific moons or their features!";

pub const RESPONSE_HEADER: &str = "🛸 Based on my analysis of Jupiter's moons:\n\n";

/// One entry in the conversation log. Never mutated after append.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub text: String,
    pub is_user: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moon_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            moon_name: None,
            source_url: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            moon_name: None,
            source_url: None,
        }
    }
}

/// Append-only message log plus the in-flight flag for a single session.
/// The caller holds the lock; nothing here is shared.
#[derive(Debug, Default)]
pub struct Conversation {
    pub messages: Vec<Message>,
    pub processing: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A successful query's payload: the chat message text plus deduplicated
/// source attribution.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub text: String,
    pub sources: BTreeSet<String>,
}

/// Terminal state of one `handle_query` call.
#[derive(Debug)]
pub enum QueryOutcome {
    /// Empty input: nothing was done, nothing was appended.
    Ignored,
    /// Another query is already in flight on this conversation.
    Busy,
    /// A chat response was produced: an answer, the fixed no-match message,
    /// or a recovered-error apology. All three are successful outcomes.
    Responded(Response),
    /// Grounded synthesis failed; the question could not be answered.
    Failed(PipelineError),
}

/// Sequences retrieval, aggregation, and synthesis for one question, owning
/// the recovery policy: embedding/retrieval errors become an apology reply,
/// snippet-mode synthesis errors are swallowed by the fallback, and only
/// grounded-mode synthesis errors fail the query.
pub struct Assistant {
    retriever: Retriever,
    synthesizer: Synthesizer,
    pipeline: PipelineSettings,
}

impl Assistant {
    pub fn new(retriever: Retriever, synthesizer: Synthesizer, pipeline: PipelineSettings) -> Self {
        Self {
            retriever,
            synthesizer,
            pipeline,
        }
    }

    /// Runs one query against the conversation. The `processing` flag is set
    /// for the duration and cleared on every exit path below the guards.
    pub async fn handle_query(
        &self,
        conversation: &mut Conversation,
        question: &str,
    ) -> QueryOutcome {
        if question.trim().is_empty() {
            return QueryOutcome::Ignored;
        }
        if conversation.processing {
            return QueryOutcome::Busy;
        }

        conversation.processing = true;
        conversation.messages.push(Message::user(question));

        let outcome = self.run_pipeline(question).await;

        if let QueryOutcome::Responded(response) = &outcome {
            conversation
                .messages
                .push(Message::assistant(response.text.clone()));
        }
        conversation.processing = false;

        outcome
    }

    async fn run_pipeline(&self, question: &str) -> QueryOutcome {
        let matches = match self.retriever.retrieve(question, self.pipeline.top_k).await {
            Ok(matches) => matches,
            Err(err) => {
                tracing::warn!("query recovered from pipeline failure: {}", err);
                return QueryOutcome::Responded(Response {
                    text: format!(
                        "I encountered an error while searching the database: {}",
                        err
                    ),
                    sources: BTreeSet::new(),
                });
            }
        };

        if matches.is_empty() {
            tracing::info!("no matches for query");
            return QueryOutcome::Responded(Response {
                text: NO_MATCH_MESSAGE.to_string(),
                sources: BTreeSet::new(),
            });
        }

        let sources: BTreeSet<String> = matches
            .iter()
            .filter_map(|m| m.metadata.source_url.clone())
            .collect();
        let groups = aggregate(&matches, self.pipeline.aggregation);

        let text = match self.pipeline.synthesis_mode {
            SynthesisMode::Snippet => {
                let mut body = String::from(RESPONSE_HEADER);
                for group in &groups {
                    let raw = snippet_source_text(group);
                    let enhanced = self.synthesizer.synthesize_snippet(&raw).await;
                    body.push_str(&enhanced);
                    body.push_str("\n\n");
                }
                body
            }
            SynthesisMode::Verbatim => {
                let mut body = String::from(RESPONSE_HEADER);
                body.push_str(&render_bullets(&groups));
                body
            }
            SynthesisMode::Grounded => {
                let context = render_context(&groups);
                match self.synthesizer.synthesize_answer(question, &context).await {
                    Ok(answer) => answer,
                    Err(err) => {
                        tracing::error!("grounded synthesis failed: {}", err);
                        return QueryOutcome::Failed(err);
                    }
                }
            }
        };

        QueryOutcome::Responded(Response { text, sources })
    }
}
