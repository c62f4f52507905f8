//! search, navigate, stats, nodes, edges, export, history.

use super::print_json;
use crate::table::{Align, Table};
use crate::ui;
use anyhow::{anyhow, Context};
use mindgraph_memory::MindGraph;
use mindgraph_types::graph::{ExportFormat, Neighbor, NodeId, NodeRanking};
use mindgraph_types::request::SearchRequest;
use std::io::Write;
use std::path::Path;

pub async fn cmd_search(
    graph: &MindGraph,
    query: String,
    tags: Vec<String>,
    top_k: usize,
    json: bool,
) -> anyhow::Result<()> {
    let hits = graph
        .search(SearchRequest {
            query,
            tags: if tags.is_empty() { None } else { Some(tags) },
            top_k,
        })
        .await?;

    if json {
        return print_json(&hits);
    }
    if hits.is_empty() {
        println!("No matching memories.");
        return Ok(());
    }
    let mut table = Table::new(&["ID", "Similarity", "Priority", "Accesses", "Tags", "Content"])
        .align(1, Align::Right)
        .align(3, Align::Right);
    for hit in &hits {
        table.add_row(&[
            hit.node_id.to_string(),
            ui::score(hit.similarity),
            hit.priority.to_string(),
            hit.access_count.to_string(),
            ui::tags(&hit.tags),
            hit.content.clone(),
        ]);
    }
    table.print();
    Ok(())
}

fn neighbor_table(neighbors: &[Neighbor]) -> Table {
    let mut table = Table::new(&["ID", "Relationship", "Strength", "Content"]).align(2, Align::Right);
    for n in neighbors {
        table.add_row(&[
            n.node_id.to_string(),
            n.relationship.clone(),
            ui::score(n.semantic_strength),
            n.content.clone(),
        ]);
    }
    table
}

pub fn cmd_navigate(graph: &MindGraph, id: &str, json: bool) -> anyhow::Result<()> {
    let nav = graph.navigate(&NodeId::from(id))?;
    if json {
        return print_json(&nav);
    }

    ui::section(nav.node.id.as_str());
    ui::kv("Content", &nav.node.content);
    ui::kv("Tags", &ui::tags(&nav.node.tags));
    ui::kv("Priority", nav.node.priority.as_str());
    ui::kv("Created", &nav.node.created_at.to_rfc3339());
    ui::kv("Accesses", &nav.node.access_count.to_string());

    for (title, neighbors) in [
        ("Outgoing", &nav.outgoing_connections),
        ("Incoming", &nav.incoming_connections),
    ] {
        ui::blank();
        ui::section(&format!("{title} ({})", neighbors.len()));
        if !neighbors.is_empty() {
            neighbor_table(neighbors).print();
        }
    }
    Ok(())
}

fn leader(ranking: &Option<NodeRanking>, unit: &str) -> String {
    match ranking {
        Some(r) => format!("{} ({} {unit})", r.node_id, r.count),
        None => "-".to_string(),
    }
}

pub fn cmd_stats(graph: &MindGraph, json: bool) -> anyhow::Result<()> {
    let stats = graph.stats()?;
    if json {
        return print_json(&stats);
    }
    ui::section("Memory graph");
    ui::kv("Nodes", &stats.total_nodes.to_string());
    ui::kv("Edges", &stats.total_edges.to_string());
    ui::kv("Accesses", &stats.total_accesses.to_string());
    ui::kv("Most linked", &leader(&stats.most_connected, "edges"));
    ui::kv("Most opened", &leader(&stats.most_accessed, "visits"));
    Ok(())
}

pub fn cmd_nodes(graph: &MindGraph, json: bool) -> anyhow::Result<()> {
    let nodes = graph.list_nodes()?;
    if json {
        return print_json(&nodes);
    }
    if nodes.is_empty() {
        println!("No memories stored yet.");
        return Ok(());
    }
    let mut table = Table::new(&["ID", "Priority", "Accesses", "Tags", "Content"])
        .align(2, Align::Right);
    for n in &nodes {
        table.add_row(&[
            n.id.to_string(),
            n.priority.to_string(),
            n.access_count.to_string(),
            ui::tags(&n.tags),
            n.content.clone(),
        ]);
    }
    table.print();
    Ok(())
}

pub fn cmd_edges(graph: &MindGraph, json: bool) -> anyhow::Result<()> {
    let edges = graph.list_edges()?;
    if json {
        return print_json(&edges);
    }
    if edges.is_empty() {
        println!("No connections yet.");
        return Ok(());
    }
    let mut table = Table::new(&["Source", "Relationship", "Target", "Strength", "Created"])
        .align(3, Align::Right);
    for e in &edges {
        table.add_row(&[
            e.source_id.to_string(),
            e.relationship.clone(),
            e.target_id.to_string(),
            ui::score(e.semantic_strength),
            e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    table.print();
    Ok(())
}

pub fn cmd_export(graph: &MindGraph, format: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let format: ExportFormat = format.parse().map_err(|e: String| anyhow!(e))?;
    let bytes = graph.export(format)?;
    match output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            ui::success(&format!("Exported {} bytes to {}", bytes.len(), path.display()));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            if format == ExportFormat::Json {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

pub fn cmd_history(graph: &MindGraph, id: &str, limit: usize, json: bool) -> anyhow::Result<()> {
    let entries = graph.access_history(&NodeId::from(id), limit)?;
    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No recorded accesses for {id}.");
        return Ok(());
    }
    let mut table = Table::new(&["When", "Type"]);
    for e in &entries {
        table.add_row(&[e.accessed_at.to_rfc3339(), e.access_type.to_string()]);
    }
    table.print();
    Ok(())
}
