//! Newline-delimited JSON chat stream decoding.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::error::LlmError;
use crate::provider::ChatStream;

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChatDelta>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: String,
}

struct LineReader<S> {
    bytes: Pin<Box<S>>,
    buf: Vec<u8>,
    finished: bool,
}

/// Convert a raw byte stream of NDJSON chat objects into a `ChatStream`.
///
/// Lines without `message.content` are skipped. A transport error ends the
/// stream after being yielded once.
pub(crate) fn ndjson_to_stream<S, B, E>(bytes: S) -> ChatStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<LlmError> + Send + 'static,
{
    let reader = LineReader {
        bytes: Box::pin(bytes),
        buf: Vec::new(),
        finished: false,
    };
    Box::pin(futures::stream::unfold(
        reader,
        next_fragment::<S, B, E>,
    ))
}

async fn next_fragment<S, B, E>(
    mut reader: LineReader<S>,
) -> Option<(Result<String, LlmError>, LineReader<S>)>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<LlmError>,
{
    loop {
        if let Some(pos) = reader.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = reader.buf.drain(..=pos).collect();
            if let Some(item) = parse_line(&line) {
                return Some((item, reader));
            }
            continue;
        }

        if reader.finished {
            if reader.buf.is_empty() {
                return None;
            }
            let line = std::mem::take(&mut reader.buf);
            return parse_line(&line).map(|item| (item, reader));
        }

        match reader.bytes.next().await {
            Some(Ok(chunk)) => reader.buf.extend_from_slice(chunk.as_ref()),
            Some(Err(e)) => {
                reader.finished = true;
                reader.buf.clear();
                return Some((Err(e.into()), reader));
            }
            None => reader.finished = true,
        }
    }
}

fn parse_line(line: &[u8]) -> Option<Result<String, LlmError>> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match serde_json::from_slice::<ChatChunk>(line) {
        Ok(chunk) => {
            if let Some(err) = chunk.error {
                return Some(Err(LlmError::Other(format!("chat stream error: {err}"))));
            }
            chunk
                .message
                .map(|m| m.content)
                .filter(|c| !c.is_empty())
                .map(Ok)
        }
        Err(e) => Some(Err(LlmError::Json(e))),
    }
}
