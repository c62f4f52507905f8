//! Append-only access log and the navigate counter.

use crate::graph::{node_exists, parse_timestamp};
use chrono::Utc;
use mindgraph_types::error::{MindGraphError, MindGraphResult};
use mindgraph_types::graph::{AccessLogEntry, AccessType, NodeId};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Access log backed by SQLite.
#[derive(Clone)]
pub struct AccessLog {
    conn: Arc<Mutex<Connection>>,
}

impl AccessLog {
    /// Create a new access log wrapping the given connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Log one access. A navigate access also bumps the node's `access_count`.
    pub fn record(&self, node_id: &NodeId, access_type: AccessType) -> MindGraphResult<()> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        if !node_exists(&tx, node_id)? {
            return Err(MindGraphError::NotFound(node_id.to_string()));
        }
        append(&tx, node_id, access_type)?;
        tx.commit()
            .map_err(|e| MindGraphError::Storage(e.to_string()))
    }

    /// Most recent accesses of a node, newest first.
    pub fn history(&self, node_id: &NodeId, limit: usize) -> MindGraphResult<Vec<AccessLogEntry>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        if !node_exists(&conn, node_id)? {
            return Err(MindGraphError::NotFound(node_id.to_string()));
        }
        let mut stmt = conn
            .prepare(
                "SELECT accessed_at, access_type FROM access_logs
                 WHERE node_id = ?1 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params![node_id.as_str(), limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (accessed_str, type_str) =
                row.map_err(|e| MindGraphError::Storage(e.to_string()))?;
            entries.push(AccessLogEntry {
                node_id: node_id.clone(),
                accessed_at: parse_timestamp(&accessed_str)?,
                access_type: type_str.parse().map_err(MindGraphError::Storage)?,
            });
        }
        Ok(entries)
    }
}

/// Append a log row inside the caller's transaction.
///
/// The counter update is a single `access_count + 1` statement, so concurrent
/// navigations never lose increments.
pub(crate) fn append(
    conn: &Connection,
    node_id: &NodeId,
    access_type: AccessType,
) -> MindGraphResult<()> {
    conn.execute(
        "INSERT INTO access_logs (node_id, accessed_at, access_type) VALUES (?1, ?2, ?3)",
        rusqlite::params![node_id.as_str(), Utc::now().to_rfc3339(), access_type.as_str()],
    )
    .map_err(|e| MindGraphError::Storage(e.to_string()))?;

    if access_type == AccessType::Navigate {
        conn.execute(
            "UPDATE nodes SET access_count = access_count + 1 WHERE id = ?1",
            rusqlite::params![node_id.as_str()],
        )
        .map_err(|e| MindGraphError::Storage(e.to_string()))?;
    }
    Ok(())
}
