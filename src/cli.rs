use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "coi-rag",
    version,
    about = "Semantic search and Q&A over the COI codebase via a local Ollama runtime"
)]
pub struct Cli {
    /// Configuration file (defaults to $COI_RAG_CONFIG, then config/default.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build or rebuild the vector index.
    Index,

    /// Search for relevant code chunks.
    Search {
        /// Search query.
        query: String,
        /// Number of results.
        #[arg(short)]
        k: Option<usize>,
    },

    /// Ask a question with retrieved code as context.
    Ask {
        /// Question to ask.
        question: String,
        /// Number of chunks to retrieve.
        #[arg(short)]
        k: Option<usize>,
    },
}
