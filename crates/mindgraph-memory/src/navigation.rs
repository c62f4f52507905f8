//! One-hop neighbourhood expansion.

use crate::access::append;
use crate::graph::{load_neighbors, load_node, Direction};
use mindgraph_types::error::{MindGraphError, MindGraphResult};
use mindgraph_types::graph::{AccessType, Navigation, NodeId};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Walks from a node to its immediate neighbours.
#[derive(Clone)]
pub struct Navigator {
    conn: Arc<Mutex<Connection>>,
}

impl Navigator {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Fetch a node with its outgoing and incoming edges and count the visit.
    ///
    /// Reads, the log append, and the counter bump share one transaction, so
    /// the returned `access_count` is exactly the post-increment value.
    pub fn navigate(&self, node_id: &NodeId) -> MindGraphResult<Navigation> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;

        let node = load_node(&tx, node_id)?
            .ok_or_else(|| MindGraphError::NotFound(node_id.to_string()))?;
        let outgoing_connections = load_neighbors(&tx, node_id, Direction::Outgoing)?;
        let incoming_connections = load_neighbors(&tx, node_id, Direction::Incoming)?;
        append(&tx, node_id, AccessType::Navigate)?;
        tx.commit()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;

        let mut summary = node.summary();
        summary.access_count += 1;
        debug!(
            node = %node_id,
            outgoing = outgoing_connections.len(),
            incoming = incoming_connections.len(),
            "navigate"
        );
        Ok(Navigation {
            node: summary,
            outgoing_connections,
            incoming_connections,
        })
    }
}
