//! Aggregate statistics over the graph.
//!
//! Leader ties go to the lexicographically lowest node id. A self-loop counts
//! once toward its node's degree.

use mindgraph_types::error::{MindGraphError, MindGraphResult};
use mindgraph_types::graph::{GraphStats, NodeId, NodeRanking};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Computes counts and centrality/access leaders.
#[derive(Clone)]
pub struct StatsEngine {
    conn: Arc<Mutex<Connection>>,
}

impl StatsEngine {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn stats(&self) -> MindGraphResult<GraphStats> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;

        Ok(GraphStats {
            total_nodes: count(&conn, "SELECT COUNT(*) FROM nodes")?,
            total_edges: count(&conn, "SELECT COUNT(*) FROM edges")?,
            total_accesses: count(&conn, "SELECT COUNT(*) FROM access_logs")?,
            most_connected: leader(
                &conn,
                "SELECT n.id, n.content,
                        (SELECT COUNT(*) FROM edges e
                         WHERE e.source_id = n.id OR e.target_id = n.id) AS degree
                 FROM nodes n
                 ORDER BY degree DESC, n.id ASC
                 LIMIT 1",
            )?,
            most_accessed: leader(
                &conn,
                "SELECT id, content, access_count FROM nodes
                 ORDER BY access_count DESC, id ASC
                 LIMIT 1",
            )?,
        })
    }
}

fn count(conn: &Connection, sql: &str) -> MindGraphResult<u64> {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .map(|n| n.max(0) as u64)
        .map_err(|e| MindGraphError::Storage(e.to_string()))
}

fn leader(conn: &Connection, sql: &str) -> MindGraphResult<Option<NodeRanking>> {
    let result = conn.query_row(sql, [], |row| {
        Ok(NodeRanking {
            node_id: NodeId(row.get(0)?),
            content: row.get(1)?,
            count: row.get::<_, i64>(2)?.max(0) as u64,
        })
    });
    match result {
        Ok(ranking) => Ok(Some(ranking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(MindGraphError::Storage(e.to_string())),
    }
}
