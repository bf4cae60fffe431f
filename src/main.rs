mod cli;
mod commands;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use coi_rag_core::Config;
use coi_rag_index::IndexError;
use coi_rag_llm::ollama::OllamaProvider;

use crate::cli::{Cli, Command};

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const INTERRUPTED: u8 = 130;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_subscriber();
    let cli = Cli::parse();

    tokio::select! {
        result = run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report_error(&e),
        },
        () = interrupted(tokio::signal::ctrl_c()) => {
            let _ = std::io::stdout().flush();
            eprintln!("\nInterrupted");
            ExitCode::from(INTERRUPTED)
        }
    }
}

/// Resolves when `signal` reports Ctrl-C. If the handler cannot be installed
/// the command keeps running without interrupt support.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("Ctrl-C handler unavailable: {e}");
        std::future::pending::<()>().await;
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = resolve_config_path(cli.config);
    let config = Config::load(&config_path)?;
    config.validate().context("invalid configuration")?;
    tracing::debug!(config = %config_path.display(), "configuration loaded");

    let provider = Arc::new(
        OllamaProvider::new(
            &config.llm.base_url,
            config.llm.chat_model.clone(),
            config.llm.embedding_model.clone(),
            &config.llm.timeouts(),
        )
        .context("failed to set up the Ollama client")?,
    );

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Index => {
            commands::run_index(&config, provider, &mut out).await?;
        }
        Command::Search { query, k } => {
            let k = k.unwrap_or(config.search.top_k);
            commands::run_search(&config, provider, &query, k, &mut out).await?;
        }
        Command::Ask { question, k } => {
            let k = k.unwrap_or(config.search.top_k);
            commands::run_ask(&config, provider, &question, k, &mut out).await?;
        }
    }
    out.flush()?;
    Ok(())
}

fn report_error(e: &anyhow::Error) -> ExitCode {
    if let Some(IndexError::NotFound { dir }) = e.downcast_ref::<IndexError>() {
        eprintln!(
            "Index not found in {}. Run `coi-rag index` first.",
            dir.display()
        );
    } else {
        eprintln!("Error: {e:#}");
    }
    ExitCode::FAILURE
}

fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Ok(path) = std::env::var("COI_RAG_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
