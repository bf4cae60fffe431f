//! Test-only mock LLM provider.

use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{ChatStream, LlmProvider, Message};

#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    /// `(needle, vector)` pairs; the first needle contained in the text wins.
    pub embeddings: Vec<(String, Vec<f32>)>,
    pub default_embedding: Vec<f32>,
    /// Texts containing any of these substrings fail to embed.
    pub fail_containing: Vec<String>,
    pub fragments: Vec<String>,
    pub fail_chat: bool,
    embedded: Arc<Mutex<Vec<String>>>,
    prompts: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    #[must_use]
    pub fn with_default_embedding(vector: Vec<f32>) -> Self {
        Self {
            default_embedding: vector,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, needle: &str, vector: Vec<f32>) -> Self {
        self.embeddings.push((needle.to_owned(), vector));
        self
    }

    #[must_use]
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_containing.push(needle.to_owned());
        self
    }

    #[must_use]
    pub fn with_fragments(mut self, fragments: &[&str]) -> Self {
        self.fragments = fragments.iter().map(|f| (*f).to_owned()).collect();
        self
    }

    /// Every text passed to `embed`, in call order.
    #[must_use]
    pub fn embedded_texts(&self) -> Vec<String> {
        self.embedded.lock().unwrap().clone()
    }

    /// Every message list passed to `chat_stream`, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embedded.lock().unwrap().push(text.to_owned());
        if self.fail_containing.iter().any(|n| text.contains(n.as_str())) {
            return Err(LlmError::Other("mock embedding failure".into()));
        }
        Ok(self
            .embeddings
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map_or_else(|| self.default_embedding.clone(), |(_, v)| v.clone()))
    }

    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream, LlmError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let items: Vec<Result<String, LlmError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
