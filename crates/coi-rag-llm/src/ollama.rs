//! Ollama HTTP API: `/api/embed` and streamed `/api/chat`.

use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::http::{Timeouts, embed_client, stream_client};
use crate::ndjson::ndjson_to_stream;
use crate::provider::{ChatStream, LlmProvider, Message};

const EMBED_PATH: &str = "/api/embed";
const CHAT_PATH: &str = "/api/chat";

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    embed_client: reqwest::Client,
    stream_client: reqwest::Client,
    base_url: String,
    chat_model: String,
    embedding_model: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

impl OllamaProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be constructed.
    pub fn new(
        base_url: &str,
        chat_model: String,
        embedding_model: String,
        timeouts: &Timeouts,
    ) -> Result<Self> {
        Ok(Self {
            embed_client: embed_client(timeouts)?,
            stream_client: stream_client(timeouts)?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            chat_model,
            embedding_model,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

async fn service_error(endpoint: &'static str, response: reqwest::Response) -> LlmError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(endpoint, %status, body = %body, "Ollama request rejected");
    LlmError::Service {
        endpoint,
        status: status.as_u16(),
        body,
    }
}

impl LlmProvider for OllamaProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbedRequest {
            model: &self.embedding_model,
            input: text,
        };

        let response = self
            .embed_client
            .post(format!("{}{EMBED_PATH}", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(service_error(EMBED_PATH, response).await);
        }

        let text = response.text().await?;
        let parsed: EmbedResponse = serde_json::from_str(&text)?;

        parsed
            .embeddings
            .and_then(|rows| rows.into_iter().next())
            .filter(|v| !v.is_empty())
            .ok_or(LlmError::EmptyResponse {
                endpoint: EMBED_PATH,
            })
    }

    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream> {
        let body = ChatRequest {
            model: &self.chat_model,
            messages,
            stream: true,
        };

        let response = self
            .stream_client
            .post(format!("{}{CHAT_PATH}", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(service_error(CHAT_PATH, response).await);
        }

        tracing::debug!(model = %self.chat_model, "chat stream opened");
        Ok(ndjson_to_stream(response.bytes_stream()))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(url: &str) -> OllamaProvider {
        OllamaProvider::new(
            url,
            "qwen2.5-coder".into(),
            "nomic-embed-text".into(),
            &Timeouts::default(),
        )
        .unwrap()
    }

    #[test]
    fn trailing_slash_trimmed() {
        let p = provider("http://localhost:11434/");
        assert_eq!(p.base_url(), "http://localhost:11434");
        assert_eq!(p.chat_model(), "qwen2.5-coder");
        assert_eq!(p.embedding_model(), "nomic-embed-text");
        assert_eq!(p.name(), "ollama");
    }

    #[tokio::test]
    async fn embed_sends_model_and_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_json(serde_json::json!({
                "model": "nomic-embed-text",
                "input": "hello"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.5, -1.0, 2.0]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let vector = provider(&server.uri()).embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.5, -1.0, 2.0]);
    }

    #[tokio::test]
    async fn embed_uses_first_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0], [2.0]]
            })))
            .mount(&server)
            .await;

        assert_eq!(provider(&server.uri()).embed("x").await.unwrap(), vec![1.0]);
    }

    #[tokio::test]
    async fn embed_non_success_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).embed("x").await.unwrap_err();
        match err {
            LlmError::Service {
                endpoint,
                status,
                body,
            } => {
                assert_eq!(endpoint, "/api/embed");
                assert_eq!(status, 404);
                assert_eq!(body, "model not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn embed_missing_field_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).embed("x").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn embed_malformed_body_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).embed("x").await.unwrap_err();
        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn embed_unreachable_is_transport_error() {
        let err = provider("http://127.0.0.1:1").embed("x").await.unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
    }

    #[tokio::test]
    async fn chat_stream_yields_fragments() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"The \"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"answer\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(serde_json::json!({
                "model": "qwen2.5-coder",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "q"}
                ],
                "stream": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let stream = provider(&server.uri())
            .chat_stream(&[Message::system("sys"), Message::user("q")])
            .await
            .unwrap();
        let fragments: Vec<String> = stream.map(Result::unwrap).collect().await;
        assert_eq!(fragments.concat(), "The answer");
    }

    #[tokio::test]
    async fn chat_non_success_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = provider(&server.uri())
            .chat_stream(&[Message::user("q")])
            .await;
        assert!(matches!(
            result,
            Err(LlmError::Service { status: 500, .. })
        ));
    }
}
