//! Full index build: collect → chunk → embed → store.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use coi_rag_llm::provider::LlmProvider;

use crate::chunker::{Chunk, ChunkerConfig, chunk_text};
use crate::collector::{CollectorConfig, collect_files, display_path};
use crate::context::contextualize_for_embedding;
use crate::error::Result;
use crate::matrix::EmbeddingMatrix;
use crate::store::{Index, IndexStore};

/// Indexer configuration.
#[derive(Debug, Clone, Default)]
pub struct IndexerConfig {
    pub collector: CollectorConfig,
    pub chunker: ChunkerConfig,
}

/// A chunk left out of the index because it could not be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChunk {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub reason: String,
}

/// Summary of an indexing run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub files_found: usize,
    pub files_indexed: usize,
    /// `(path, reason)` for files that could not be read.
    pub unreadable_files: Vec<(String, String)>,
    pub chunks_embedded: usize,
    pub skipped_chunks: Vec<SkippedChunk>,
    pub duration_ms: u64,
}

/// Progress notifications emitted during [`Indexer::build`].
#[derive(Debug, Clone, Copy)]
pub enum BuildEvent<'a> {
    /// File collection finished.
    Collected { total: usize },
    /// One file has been chunked and embedded.
    File {
        position: usize,
        total: usize,
        file: &'a str,
        chunks: usize,
        failed: usize,
    },
}

/// Builds a fresh index over a source tree, replacing any previous one.
pub struct Indexer<P: LlmProvider> {
    store: IndexStore,
    provider: Arc<P>,
    config: IndexerConfig,
}

impl<P: LlmProvider> Indexer<P> {
    #[must_use]
    pub fn new(store: IndexStore, provider: Arc<P>, config: IndexerConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    #[must_use]
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Index every collected file under `root`.
    ///
    /// Embedding requests are issued one at a time in chunk order. Files that
    /// cannot be read and chunks that fail to embed are recorded in the report
    /// and left out of the index.
    ///
    /// # Errors
    ///
    /// Returns an error if a collector pattern is invalid or the index cannot
    /// be written.
    pub async fn build(
        &self,
        root: &Path,
        mut on_event: impl FnMut(&BuildEvent<'_>),
    ) -> Result<IndexReport> {
        let start = Instant::now();
        let mut report = IndexReport::default();

        let files = collect_files(root, &self.config.collector)?;
        report.files_found = files.len();
        let total = files.len();
        tracing::info!(total, root = %root.display(), "indexing started");
        on_event(&BuildEvent::Collected { total });

        let mut chunks = Vec::new();
        let mut embeddings = EmbeddingMatrix::new();

        for (i, rel) in files.iter().enumerate() {
            let file = display_path(rel);

            let source = match tokio::fs::read(root.join(rel)).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::warn!(file = %file, "skipping unreadable file: {e}");
                    report.unreadable_files.push((file, e.to_string()));
                    continue;
                }
            };

            let file_chunks = chunk_text(&source, &file, &self.config.chunker);
            let mut embedded = 0usize;
            let mut failed = 0usize;

            for chunk in file_chunks {
                match self.embed_chunk(&chunk, &mut embeddings).await {
                    Ok(()) => {
                        chunks.push(chunk);
                        embedded += 1;
                    }
                    Err(reason) => {
                        tracing::warn!(
                            file = %chunk.file,
                            lines = format_args!("{}-{}", chunk.start_line, chunk.end_line),
                            "embedding failed: {reason}"
                        );
                        report.skipped_chunks.push(SkippedChunk {
                            file: chunk.file,
                            start_line: chunk.start_line,
                            end_line: chunk.end_line,
                            reason,
                        });
                        failed += 1;
                    }
                }
            }

            if embedded > 0 {
                report.files_indexed += 1;
            }
            report.chunks_embedded += embedded;

            tracing::info!(
                file = %file,
                progress = format_args!("{}/{total}", i + 1),
                embedded,
                failed,
            );
            on_event(&BuildEvent::File {
                position: i + 1,
                total,
                file: &file,
                chunks: embedded,
                failed,
            });
        }

        let index = Index {
            chunks,
            embeddings,
            config: self.config.chunker,
        };
        self.store.save(&index)?;

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            chunks = report.chunks_embedded,
            skipped = report.skipped_chunks.len(),
            duration_ms = report.duration_ms,
            "indexing finished"
        );
        Ok(report)
    }

    /// Embed one chunk and append its row. Errors come back as display text
    /// for the report.
    async fn embed_chunk(
        &self,
        chunk: &Chunk,
        embeddings: &mut EmbeddingMatrix,
    ) -> std::result::Result<(), String> {
        let text = contextualize_for_embedding(chunk);
        let vector = self
            .provider
            .embed(&text)
            .await
            .map_err(|e| e.to_string())?;
        embeddings.push_row(&vector).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use coi_rag_llm::mock::MockProvider;

    use super::*;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn config() -> IndexerConfig {
        IndexerConfig {
            collector: CollectorConfig {
                patterns: vec!["src/**/*.js".into(), "schema.sql".into()],
                exclude_dirs: vec!["node_modules".into()],
            },
            chunker: ChunkerConfig {
                chunk_size: 4,
                overlap: 1,
            },
        }
    }

    fn numbered(n: usize) -> String {
        (1..=n)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn builds_and_saves_index() {
        let src = tempfile::tempdir().unwrap();
        write(src.path(), "src/a.js", &numbered(10));
        write(src.path(), "schema.sql", "CREATE TABLE t (id INT);");
        write(src.path(), "src/node_modules/x.js", "ignored");

        let out = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::with_default_embedding(vec![1.0, 0.0]));
        let indexer = Indexer::new(IndexStore::new(out.path()), provider.clone(), config());

        let mut collected = None;
        let mut seen = Vec::new();
        let report = indexer
            .build(src.path(), |event| match *event {
                BuildEvent::Collected { total } => collected = Some(total),
                BuildEvent::File {
                    position,
                    file,
                    chunks,
                    ..
                } => seen.push((position, file.to_owned(), chunks)),
            })
            .await
            .unwrap();

        assert_eq!(collected, Some(2));
        assert_eq!(report.files_found, 2);
        assert_eq!(report.files_indexed, 2);
        assert_eq!(report.chunks_embedded, 4);
        assert!(report.skipped_chunks.is_empty());
        assert_eq!(
            seen,
            vec![(1, "schema.sql".to_owned(), 1), (2, "src/a.js".to_owned(), 3)]
        );

        let index = indexer.store().load().unwrap();
        assert_eq!(index.chunks.len(), 4);
        assert_eq!(index.embeddings.rows(), 4);
        assert_eq!(index.config, config().chunker);
        assert_eq!(index.chunks[1].file, "src/a.js");
        assert_eq!((index.chunks[3].start_line, index.chunks[3].end_line), (7, 10));
    }

    #[tokio::test]
    async fn embeds_contextualized_text_in_order() {
        let src = tempfile::tempdir().unwrap();
        write(src.path(), "src/a.js", "const a = 1;");
        write(src.path(), "src/b.js", "const b = 2;");

        let out = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::with_default_embedding(vec![0.5]));
        let indexer = Indexer::new(IndexStore::new(out.path()), provider.clone(), config());
        indexer.build(src.path(), |_| {}).await.unwrap();

        assert_eq!(
            provider.embedded_texts(),
            vec![
                "File: src/a.js (lines 1-1)\n\nconst a = 1;".to_owned(),
                "File: src/b.js (lines 1-1)\n\nconst b = 2;".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn failing_chunk_is_reported_and_left_out() {
        let src = tempfile::tempdir().unwrap();
        write(src.path(), "src/a.js", "line 1\nline 2\nline 3\nline 4\nBOOM\nline 6");

        let out = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::with_default_embedding(vec![1.0]).failing_on("BOOM"));
        let indexer = Indexer::new(IndexStore::new(out.path()), provider, config());
        let report = indexer.build(src.path(), |_| {}).await.unwrap();

        assert_eq!(report.chunks_embedded, 1);
        assert_eq!(report.skipped_chunks.len(), 1);
        let skipped = &report.skipped_chunks[0];
        assert_eq!(
            (skipped.file.as_str(), skipped.start_line, skipped.end_line),
            ("src/a.js", 4, 6)
        );
        assert!(skipped.reason.contains("mock embedding failure"));

        let index = indexer.store().load().unwrap();
        assert_eq!(index.chunks.len(), 1);
        assert_eq!(index.chunks[0].end_line, 4);
    }

    #[tokio::test]
    async fn empty_tree_produces_empty_index() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::with_default_embedding(vec![1.0]));
        let indexer = Indexer::new(IndexStore::new(out.path()), provider.clone(), config());

        let report = indexer.build(src.path(), |_| {}).await.unwrap();
        assert_eq!(report.files_found, 0);
        assert!(provider.embedded_texts().is_empty());
        assert!(indexer.store().load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_utf8_file_is_read_lossily() {
        let src = tempfile::tempdir().unwrap();
        let path = src.path().join("src/latin1.js");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"caf\xe9 = 1;").unwrap();

        let out = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::with_default_embedding(vec![1.0]));
        let indexer = Indexer::new(IndexStore::new(out.path()), provider, config());
        let report = indexer.build(src.path(), |_| {}).await.unwrap();

        assert_eq!(report.chunks_embedded, 1);
        let index = indexer.store().load().unwrap();
        assert!(index.chunks[0].text.starts_with("caf"));
    }

    #[tokio::test]
    async fn inconsistent_dimension_is_skipped() {
        let src = tempfile::tempdir().unwrap();
        write(src.path(), "src/a.js", "first");
        write(src.path(), "src/b.js", "second");

        let out = tempfile::tempdir().unwrap();
        let provider = Arc::new(
            MockProvider::with_default_embedding(vec![1.0, 0.0]).with_embedding("second", vec![1.0]),
        );
        let indexer = Indexer::new(IndexStore::new(out.path()), provider, config());
        let report = indexer.build(src.path(), |_| {}).await.unwrap();

        assert_eq!(report.chunks_embedded, 1);
        assert_eq!(report.skipped_chunks[0].file, "src/b.js");
        assert_eq!(indexer.store().load().unwrap().embeddings.rows(), 1);
    }
}
