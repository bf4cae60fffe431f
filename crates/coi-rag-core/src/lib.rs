//! Configuration and retrieval-augmented answering for coi-rag.

pub mod answer;
pub mod config;

pub use config::Config;
