//! insert, connect.

use super::print_json;
use crate::table::{Align, Table};
use crate::ui;
use anyhow::anyhow;
use mindgraph_memory::MindGraph;
use mindgraph_types::graph::Priority;
use mindgraph_types::request::{ConnectRequest, InsertRequest};

pub async fn cmd_insert(
    graph: &MindGraph,
    content: String,
    id: Option<String>,
    tags: Vec<String>,
    priority: &str,
    json: bool,
) -> anyhow::Result<()> {
    let priority: Priority = priority.parse().map_err(|e: String| anyhow!(e))?;
    let outcome = graph
        .insert(InsertRequest {
            id,
            content,
            tags,
            priority,
        })
        .await?;

    if json {
        return print_json(&outcome);
    }

    ui::success(&format!("Stored {}", outcome.node_id));
    if outcome.suggested_connections.is_empty() {
        ui::hint("no similar memories yet");
        return Ok(());
    }
    ui::blank();
    ui::section("Suggested connections");
    let mut table = Table::new(&["ID", "Similarity", "Tags", "Content"]).align(1, Align::Right);
    for s in &outcome.suggested_connections {
        table.add_row(&[
            s.node_id.to_string(),
            ui::score(s.similarity),
            ui::tags(&s.tags),
            s.content.clone(),
        ]);
    }
    table.print();
    ui::hint(&format!(
        "link one with: mindgraph connect {} <id> <relationship>",
        outcome.node_id
    ));
    Ok(())
}

pub fn cmd_connect(
    graph: &MindGraph,
    source_id: String,
    target_id: String,
    relationship: String,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = graph.connect(ConnectRequest {
        source_id,
        target_id,
        relationship,
    })?;

    if json {
        return print_json(&outcome);
    }

    let verb = if outcome.created {
        "Connected"
    } else {
        "Already connected"
    };
    ui::success(&format!(
        "{verb} {} -[{}]-> {} (strength {})",
        outcome.source_id,
        outcome.relationship,
        outcome.target_id,
        ui::score(outcome.semantic_strength)
    ));
    Ok(())
}
