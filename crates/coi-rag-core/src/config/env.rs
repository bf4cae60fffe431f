use std::path::PathBuf;
use std::str::FromStr;

use super::Config;

/// Parse `key` as `T`, warning and returning `None` on an invalid value.
fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.trim().parse::<T>() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("COI_RAG_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("COI_RAG_EMBED_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("COI_RAG_CHAT_MODEL") {
            self.llm.chat_model = v;
        }
        if let Some(secs) = parsed::<u64>("COI_RAG_EMBED_TIMEOUT") {
            self.llm.embed_timeout_secs = secs;
        }
        if let Some(secs) = parsed::<u64>("COI_RAG_CHAT_TIMEOUT") {
            self.llm.chat_timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("COI_RAG_ROOT") {
            self.index.root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("COI_RAG_INDEX_DIR") {
            self.index.dir = PathBuf::from(v);
        }
        if let Some(size) = parsed::<usize>("COI_RAG_CHUNK_SIZE") {
            self.index.chunk_size = size;
        }
        if let Some(overlap) = parsed::<usize>("COI_RAG_CHUNK_OVERLAP") {
            self.index.chunk_overlap = overlap;
        }
        if let Some(k) = parsed::<usize>("COI_RAG_TOP_K") {
            self.search.top_k = k;
        }
    }
}
