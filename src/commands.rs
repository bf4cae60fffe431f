//! Subcommand bodies. Results go to `out`; progress and status to stderr.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use coi_rag_core::Config;
use coi_rag_core::answer::AnswerComposer;
use coi_rag_index::SearchResult;
use coi_rag_index::indexer::{BuildEvent, IndexReport, Indexer, IndexerConfig};
use coi_rag_index::retriever::Retriever;
use coi_rag_index::store::IndexStore;
use coi_rag_llm::provider::LlmProvider;

const BANNER_WIDTH: usize = 60;
const PREVIEW_LINES: usize = 10;

/// Rebuild the index from scratch.
///
/// # Errors
///
/// Returns an error if collection fails or the index cannot be written.
pub async fn run_index<P: LlmProvider, W: Write>(
    config: &Config,
    provider: Arc<P>,
    out: &mut W,
) -> anyhow::Result<IndexReport> {
    let store = IndexStore::new(config.index.index_dir());
    let indexer = Indexer::new(
        store,
        provider,
        IndexerConfig {
            collector: config.index.collector(),
            chunker: config.index.chunker(),
        },
    );

    let report = indexer
        .build(&config.index.root, |event| match *event {
            BuildEvent::Collected { total } => eprintln!("Found {total} files to index"),
            BuildEvent::File {
                position,
                total,
                file,
                chunks,
                failed,
            } => {
                if failed == 0 {
                    eprintln!("  [{position}/{total}] {file} -> {chunks} chunks");
                } else {
                    eprintln!("  [{position}/{total}] {file} -> {chunks} chunks ({failed} failed)");
                }
            }
        })
        .await
        .context("indexing failed")?;

    write_report(out, &report, indexer.store().dir())?;
    Ok(report)
}

/// Print the ranked chunks for `query`.
///
/// # Errors
///
/// Returns an error if no index exists, it cannot be read, or the query
/// cannot be embedded.
pub async fn run_search<P: LlmProvider, W: Write>(
    config: &Config,
    provider: Arc<P>,
    query: &str,
    k: usize,
    out: &mut W,
) -> anyhow::Result<Vec<SearchResult>> {
    let results = search(config, provider, query, k).await?;
    if results.is_empty() {
        writeln!(out, "No results.")?;
    }
    for (i, r) in results.iter().enumerate() {
        write_hit(out, i + 1, r)?;
    }
    Ok(results)
}

/// Retrieve context for `question` and stream the model's answer to `out`.
///
/// # Errors
///
/// Returns an error if retrieval fails, the chat request is rejected, or the
/// stream breaks off.
pub async fn run_ask<P: LlmProvider, W: Write>(
    config: &Config,
    provider: Arc<P>,
    question: &str,
    k: usize,
    out: &mut W,
) -> anyhow::Result<String> {
    eprintln!("Searching for relevant code...");
    let results = search(config, provider.clone(), question, k).await?;

    eprintln!("Asking {}...", config.llm.chat_model);
    let composer = AnswerComposer::new(provider, config.ask.system_prompt.clone());
    let answer = composer.answer(&results, question, out).await?;
    writeln!(out)?;
    Ok(answer)
}

async fn search<P: LlmProvider>(
    config: &Config,
    provider: Arc<P>,
    query: &str,
    k: usize,
) -> anyhow::Result<Vec<SearchResult>> {
    let store = IndexStore::new(config.index.index_dir());
    let retriever = Retriever::open(&store, provider)?;
    let results = retriever
        .search(query, k)
        .await
        .context("search failed")?;
    Ok(results)
}

fn write_report<W: Write>(out: &mut W, report: &IndexReport, dir: &Path) -> std::io::Result<()> {
    if !report.unreadable_files.is_empty() {
        writeln!(out, "Skipped {} unreadable files:", report.unreadable_files.len())?;
        for (file, reason) in &report.unreadable_files {
            writeln!(out, "  {file}: {reason}")?;
        }
    }
    if !report.skipped_chunks.is_empty() {
        writeln!(
            out,
            "Skipped {} chunks that failed to embed:",
            report.skipped_chunks.len()
        )?;
        for c in &report.skipped_chunks {
            writeln!(out, "  {}:{}-{}: {}", c.file, c.start_line, c.end_line, c.reason)?;
        }
    }
    writeln!(
        out,
        "Indexed {} chunks from {} files",
        report.chunks_embedded, report.files_found
    )?;
    writeln!(out, "  Saved to {}", dir.display())
}

fn write_hit<W: Write>(out: &mut W, rank: usize, r: &SearchResult) -> std::io::Result<()> {
    let rule = "=".repeat(BANNER_WIDTH);
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(
        out,
        "[{rank}] {}:{}-{} (score: {:.4})",
        r.chunk.file, r.chunk.start_line, r.chunk.end_line, r.score
    )?;
    writeln!(out, "{rule}")?;

    let lines: Vec<&str> = r.chunk.text.split('\n').collect();
    for line in lines.iter().take(PREVIEW_LINES) {
        writeln!(out, "{line}")?;
    }
    if lines.len() > PREVIEW_LINES {
        writeln!(out, "  ... ({} lines total)", lines.len())?;
    }
    Ok(())
}
