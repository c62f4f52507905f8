//! Clap CLI definitions for MindGraph.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
\x1b[1;36mExamples:\x1b[0m
  mindgraph insert \"Rust ownership rules\" --tag rust --priority high
  mindgraph search \"borrow checker\" --tag rust --top-k 3
  mindgraph connect node-1a2b3c4d5e6f node-9f8e7d6c5b4a builds_on
  mindgraph navigate node-1a2b3c4d5e6f
  mindgraph stats --json
  mindgraph export --format msgpack --output graph.msgpack

\x1b[1;36mEnvironment:\x1b[0m
  MINDGRAPH_DB_PATH   Override the database path from the config file
  RUST_LOG            Log filter (default: info)";

/// MindGraph: a semantic memory graph for agents.
#[derive(Parser)]
#[command(
    name = "mindgraph",
    version,
    about = "MindGraph \u{00b7} semantic memory graph for agents",
    after_help = AFTER_HELP,
)]
pub struct Cli {
    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database (overrides config and MINDGRAPH_DB_PATH).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a new memory and print suggested connections.
    Insert {
        /// Memory text.
        content: String,
        /// Explicit node id (generated when omitted).
        #[arg(long)]
        id: Option<String>,
        /// Tag to attach (repeatable).
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
        /// Priority: critical, high, normal or low.
        #[arg(long, short = 'p', default_value = "normal")]
        priority: String,
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Find memories by meaning.
    Search {
        /// Query text.
        query: String,
        /// Only match nodes carrying any of these tags (repeatable).
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
        /// Number of results (1-100). Defaults to `[search] default_top_k`.
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Create a directed, labelled edge between two nodes.
    Connect {
        /// Source node id.
        source: String,
        /// Target node id.
        target: String,
        /// Relationship label (builds_on, supports, contrasts_with, ...).
        relationship: String,
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Open a node and show its neighbourhood (counts as an access).
    Navigate {
        /// Node id.
        id: String,
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Show graph totals and leaders.
    Stats {
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// List all nodes in insertion order.
    Nodes {
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// List all edges in creation order.
    Edges {
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Export the whole graph.
    Export {
        /// json or msgpack.
        #[arg(long, short = 'f', default_value = "json")]
        format: String,
        /// Write to this file instead of stdout.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Show the access log of a node, newest first.
    History {
        /// Node id.
        id: String,
        /// Maximum number of entries.
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_insert_with_repeated_tags() {
        let cli = Cli::parse_from([
            "mindgraph", "insert", "hello", "--tag", "a", "-t", "b", "--priority", "HIGH",
        ]);
        match cli.command {
            Commands::Insert {
                content,
                tags,
                priority,
                id,
                json,
            } => {
                assert_eq!(content, "hello");
                assert_eq!(tags, vec!["a", "b"]);
                assert_eq!(priority, "HIGH");
                assert!(id.is_none());
                assert!(!json);
            }
            _ => panic!("expected insert"),
        }
    }

    #[test]
    fn global_db_flag_after_subcommand() {
        let cli = Cli::parse_from(["mindgraph", "stats", "--db", "/tmp/x.db", "--json"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Commands::Stats { json: true }));
    }
}
