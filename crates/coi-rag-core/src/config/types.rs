use std::path::{Path, PathBuf};
use std::time::Duration;

use coi_rag_index::ChunkerConfig;
use coi_rag_index::collector::CollectorConfig;
use coi_rag_llm::http::Timeouts;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub ask: AskConfig,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_embedding_model() -> String {
    "nomic-embed-text:latest".into()
}

fn default_chat_model() -> String {
    "qwen2.5-coder:32b-32k".into()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_embed_timeout_secs() -> u64 {
    30
}

fn default_chat_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,
    /// Longest pause tolerated between two chunks of a streamed answer.
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            connect_timeout_secs: default_connect_timeout_secs(),
            embed_timeout_secs: default_embed_timeout_secs(),
            chat_timeout_secs: default_chat_timeout_secs(),
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            embed: Duration::from_secs(self.embed_timeout_secs),
            chat_idle: Duration::from_secs(self.chat_timeout_secs),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("docs/llm-context/.rag-index")
}

fn default_chunk_size() -> usize {
    ChunkerConfig::default().chunk_size
}

fn default_chunk_overlap() -> usize {
    ChunkerConfig::default().overlap
}

fn default_patterns() -> Vec<String> {
    CollectorConfig::default().patterns
}

fn default_exclude_dirs() -> Vec<String> {
    CollectorConfig::default().exclude_dirs
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Source tree to index.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Index directory; relative paths resolve against `root`.
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            dir: default_index_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            patterns: default_patterns(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

impl IndexConfig {
    #[must_use]
    pub fn index_dir(&self) -> PathBuf {
        resolve(&self.root, &self.dir)
    }

    #[must_use]
    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }

    #[must_use]
    pub fn collector(&self) -> CollectorConfig {
        CollectorConfig {
            patterns: self.patterns.clone(),
            exclude_dirs: self.exclude_dirs.clone(),
        }
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn default_top_k() -> usize {
    8
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a senior software architect analyzing the COI (Conflict of Interest) Management System.
Tech stack: Express.js + better-sqlite3 backend, Vue 3 + Pinia frontend, JWT auth, SQLite.
Workflow: Requester -> Director -> Compliance -> Partner -> Finance -> Admin Execution.
7 roles: Requester, Director, Compliance, Partner, Finance, Admin, Super Admin.
When analyzing code, identify: business domain concept, workflow stage, user roles, database tables, and dependencies.

Use the following code context to answer the question. Cite file paths and line numbers.";

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AskConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
        }
    }
}
