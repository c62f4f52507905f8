//! Command implementations.

pub mod read;
pub mod write;

use anyhow::Context;
use mindgraph_memory::MindGraph;
use mindgraph_runtime::embedding::create_embedding_driver;
use mindgraph_types::config::MindGraphConfig;
use std::path::Path;
use std::sync::Arc;

/// Build the embedding driver from `[embedding]` and open the store.
pub fn open_graph(config: &MindGraphConfig, db_override: Option<&Path>) -> anyhow::Result<MindGraph> {
    let provider = create_embedding_driver(&config.embedding)
        .context("failed to configure embedding provider")?;
    let db_path = db_override.unwrap_or(&config.db_path);
    MindGraph::open(db_path, Arc::from(provider), config.suggestions)
        .with_context(|| format!("failed to open memory graph at {}", db_path.display()))
}

/// Pretty-print any serializable value as JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
