//! Query-time retrieval over a stored index.

use std::sync::Arc;

use coi_rag_llm::provider::LlmProvider;
use serde::Serialize;

use crate::chunker::Chunk;
use crate::error::Result;
use crate::ranker::rank;
use crate::store::{Index, IndexStore};

/// A stored chunk with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f32,
}

/// Embeds queries and ranks the stored chunks against them.
pub struct Retriever<P: LlmProvider> {
    index: Index,
    provider: Arc<P>,
}

impl<P: LlmProvider> Retriever<P> {
    #[must_use]
    pub fn new(index: Index, provider: Arc<P>) -> Self {
        Self { index, provider }
    }

    /// Load the index from `store`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no index has been built, or any load error.
    pub fn open(store: &IndexStore, provider: Arc<P>) -> Result<Self> {
        Ok(Self::new(store.load()?, provider))
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Return up to `k` chunks most similar to `query`, best first.
    ///
    /// An empty index yields no results without contacting the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be embedded.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.provider.embed(query).await?;
        if query_vec.len() != self.index.embeddings.dim() {
            tracing::warn!(
                query_dim = query_vec.len(),
                index_dim = self.index.embeddings.dim(),
                "query embedding dimension differs from index; rebuild the index"
            );
        }

        let results: Vec<SearchResult> = rank(&query_vec, &self.index.embeddings, k)
            .into_iter()
            .map(|(row, score)| SearchResult {
                chunk: self.index.chunks[row].clone(),
                score,
            })
            .collect();

        tracing::debug!(query_len = query.len(), hits = results.len(), "search done");
        Ok(results)
    }
}
