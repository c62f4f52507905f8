//! MindGraph CLI: store, search and link agent memories from the terminal.
//!
//! Every invocation opens the SQLite store named by the config (or `--db`),
//! runs one command and exits.

mod cli;
mod cmd;
mod config;
mod table;
mod ui;

use crate::cli::{Cli, Commands};
use clap::Parser;
use std::process::ExitCode;

fn init_tracing_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::load_config(cli.config.as_deref());
    let graph = cmd::open_graph(&config, cli.db.as_deref())?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Insert {
            content,
            id,
            tags,
            priority,
            json,
        } => rt.block_on(cmd::write::cmd_insert(
            &graph, content, id, tags, &priority, json,
        )),
        Commands::Search {
            query,
            tags,
            top_k,
            json,
        } => {
            let top_k = top_k.unwrap_or(config.search.default_top_k);
            rt.block_on(cmd::read::cmd_search(&graph, query, tags, top_k, json))
        }
        Commands::Connect {
            source,
            target,
            relationship,
            json,
        } => cmd::write::cmd_connect(&graph, source, target, relationship, json),
        Commands::Navigate { id, json } => cmd::read::cmd_navigate(&graph, &id, json),
        Commands::Stats { json } => cmd::read::cmd_stats(&graph, json),
        Commands::Nodes { json } => cmd::read::cmd_nodes(&graph, json),
        Commands::Edges { json } => cmd::read::cmd_edges(&graph, json),
        Commands::Export { format, output } => {
            cmd::read::cmd_export(&graph, &format, output.as_deref())
        }
        Commands::History { id, limit, json } => {
            cmd::read::cmd_history(&graph, &id, limit, json)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing_stderr();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
