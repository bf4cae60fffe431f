mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values that would make indexing or search meaningless.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.base_url.trim().is_empty() {
            bail!("llm.base_url must not be empty");
        }
        if self.llm.embedding_model.trim().is_empty() {
            bail!("llm.embedding_model must not be empty");
        }
        if self.llm.chat_model.trim().is_empty() {
            bail!("llm.chat_model must not be empty");
        }
        if self.llm.connect_timeout_secs == 0 {
            bail!("llm.connect_timeout_secs must be at least 1");
        }
        if self.llm.embed_timeout_secs == 0 {
            bail!("llm.embed_timeout_secs must be at least 1");
        }
        if self.llm.chat_timeout_secs == 0 {
            bail!("llm.chat_timeout_secs must be at least 1");
        }
        if self.index.chunk_size == 0 {
            bail!("index.chunk_size must be at least 1");
        }
        if self.index.patterns.is_empty() {
            bail!("index.patterns must list at least one glob");
        }
        if self.search.top_k == 0 {
            bail!("search.top_k must be at least 1");
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            tracing::warn!(
                chunk_size = self.index.chunk_size,
                overlap = self.index.chunk_overlap,
                "overlap is not smaller than chunk size; windows advance one line at a time"
            );
        }
        Ok(())
    }
}
