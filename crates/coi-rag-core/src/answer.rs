//! Prompt assembly and streamed answers over retrieved chunks.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use coi_rag_index::SearchResult;
use coi_rag_llm::provider::{LlmProvider, Message};
use futures::StreamExt;

/// Render retrieved chunks as the context block of the prompt, best first.
#[must_use]
pub fn build_context(results: &[SearchResult]) -> String {
    let mut out = String::new();
    for (i, r) in results.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(
            out,
            "--- {} (lines {}-{}, relevance: {:.4}) ---\n{}",
            r.chunk.file, r.chunk.start_line, r.chunk.end_line, r.score, r.chunk.text
        );
    }
    out
}

/// System instruction followed by the context and question as one user turn.
#[must_use]
pub fn build_messages(system_prompt: &str, context: &str, question: &str) -> Vec<Message> {
    vec![
        Message::system(system_prompt),
        Message::user(format!(
            "## Retrieved Code Context\n\n{context}\n\n## Question\n\n{question}"
        )),
    ]
}

/// Streams a chat model's answer to a question about retrieved code.
pub struct AnswerComposer<P: LlmProvider> {
    provider: Arc<P>,
    system_prompt: String,
}

impl<P: LlmProvider> AnswerComposer<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, system_prompt: impl Into<String>) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
        }
    }

    /// Ask the chat model and write each fragment to `out` as it arrives.
    ///
    /// Returns the full answer text.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat request is rejected, the stream breaks
    /// off, or writing to `out` fails. Fragments received before a stream
    /// error have already been written.
    pub async fn answer<W: Write>(
        &self,
        results: &[SearchResult],
        question: &str,
        out: &mut W,
    ) -> anyhow::Result<String> {
        if results.is_empty() {
            tracing::warn!("no indexed code matched; asking without context");
        }
        let context = build_context(results);
        let messages = build_messages(&self.system_prompt, &context, question);

        let mut stream = self
            .provider
            .chat_stream(&messages)
            .await
            .with_context(|| format!("{} chat request failed", self.provider.name()))?;

        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment.context("answer stream interrupted")?;
            out.write_all(fragment.as_bytes())?;
            out.flush()?;
            answer.push_str(&fragment);
        }

        tracing::debug!(chars = answer.len(), "answer complete");
        Ok(answer)
    }
}
