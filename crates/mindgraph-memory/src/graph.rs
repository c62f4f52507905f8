//! Node and edge persistence backed by SQLite.
//!
//! Nodes and edges are write-once: there is no update or delete path here.
//! The only mutable column, `access_count`, is owned by [`crate::access`].

use crate::similarity::{cosine_similarity, embedding_from_bytes, embedding_to_bytes};
use chrono::{DateTime, Utc};
use mindgraph_types::error::{MindGraphError, MindGraphResult};
use mindgraph_types::graph::{ConnectOutcome, Edge, Neighbor, Node, NodeId, NodeSummary, Priority};
use mindgraph_types::request::NewEdge;
use rusqlite::{Connection, ErrorCode, Row};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

const NODE_COLUMNS: &str = "id, content, tags, priority, created_at, access_count, embedding";

/// Graph store backed by SQLite.
#[derive(Clone)]
pub struct GraphStore {
    conn: Arc<Mutex<Connection>>,
}

impl GraphStore {
    /// Create a new graph store wrapping the given connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Persist a fully formed node.
    ///
    /// The primary key decides races: of two concurrent inserts with the same
    /// id, exactly one succeeds and the other gets `DuplicateId`.
    pub fn insert_node(&self, node: &Node) -> MindGraphResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        persist_node(&conn, node)
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &NodeId) -> MindGraphResult<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        node_exists(&conn, id)
    }

    /// Fetch a node by id.
    pub fn get_node(&self, id: &NodeId) -> MindGraphResult<Node> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        load_node(&conn, id)?.ok_or_else(|| MindGraphError::NotFound(id.to_string()))
    }

    /// Every node with its embedding, in insertion order.
    pub fn all_nodes(&self) -> MindGraphResult<Vec<Node>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        load_nodes(&conn)
    }

    /// Every node without embeddings, oldest first, ties by id.
    pub fn list_nodes(&self) -> MindGraphResult<Vec<NodeSummary>> {
        let mut nodes: Vec<NodeSummary> = self.all_nodes()?.iter().map(Node::summary).collect();
        nodes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(nodes)
    }

    /// Create an edge, or report the existing one if the key is already taken.
    pub fn connect(&self, edge: &NewEdge) -> MindGraphResult<ConnectOutcome> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;

        let source = load_embedding(&tx, &edge.source_id)?
            .ok_or_else(|| MindGraphError::NotFound(edge.source_id.to_string()))?;
        let target = load_embedding(&tx, &edge.target_id)?
            .ok_or_else(|| MindGraphError::NotFound(edge.target_id.to_string()))?;
        let strength = cosine_similarity(&source, &target);

        let inserted = tx
            .execute(
                "INSERT INTO edges (source_id, target_id, relationship, semantic_strength, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(source_id, target_id, relationship) DO NOTHING",
                rusqlite::params![
                    edge.source_id.as_str(),
                    edge.target_id.as_str(),
                    edge.relationship,
                    strength as f64,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;

        let semantic_strength = if inserted == 0 {
            let existing: f64 = tx
                .query_row(
                    "SELECT semantic_strength FROM edges
                     WHERE source_id = ?1 AND target_id = ?2 AND relationship = ?3",
                    rusqlite::params![
                        edge.source_id.as_str(),
                        edge.target_id.as_str(),
                        edge.relationship,
                    ],
                    |row| row.get(0),
                )
                .map_err(|e| MindGraphError::Storage(e.to_string()))?;
            existing as f32
        } else {
            strength
        };
        tx.commit()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;

        debug!(
            source = %edge.source_id,
            target = %edge.target_id,
            relationship = %edge.relationship,
            created = inserted > 0,
            "connect"
        );
        Ok(ConnectOutcome {
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
            relationship: edge.relationship.clone(),
            semantic_strength,
            created: inserted > 0,
        })
    }

    /// Every edge, in creation order.
    pub fn list_edges(&self) -> MindGraphResult<Vec<Edge>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT source_id, target_id, relationship, semantic_strength, created_at
                 FROM edges ORDER BY id",
            )
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;

        let mut edges = Vec::new();
        for row in rows {
            let (source_id, target_id, relationship, strength, created_str) =
                row.map_err(|e| MindGraphError::Storage(e.to_string()))?;
            edges.push(Edge {
                source_id: NodeId(source_id),
                target_id: NodeId(target_id),
                relationship,
                semantic_strength: strength as f32,
                created_at: parse_timestamp(&created_str)?,
            });
        }
        Ok(edges)
    }
}

/// Which end of an edge a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Edges where the node is the source.
    Outgoing,
    /// Edges where the node is the target.
    Incoming,
}

/// Raw row from the nodes table.
struct RawNodeRow {
    id: String,
    content: String,
    tags: String,
    priority: String,
    created_at: String,
    access_count: i64,
    embedding: Vec<u8>,
}

fn read_node_row(row: &Row<'_>) -> rusqlite::Result<RawNodeRow> {
    Ok(RawNodeRow {
        id: row.get(0)?,
        content: row.get(1)?,
        tags: row.get(2)?,
        priority: row.get(3)?,
        created_at: row.get(4)?,
        access_count: row.get(5)?,
        embedding: row.get(6)?,
    })
}

impl RawNodeRow {
    fn into_node(self) -> MindGraphResult<Node> {
        let priority: Priority = self
            .priority
            .parse()
            .map_err(|e: String| MindGraphError::Storage(format!("node {}: {e}", self.id)))?;
        Ok(Node {
            tags: parse_tags(&self.tags)?,
            created_at: parse_timestamp(&self.created_at)?,
            access_count: self.access_count.max(0) as u64,
            embedding: embedding_from_bytes(&self.embedding),
            id: NodeId(self.id),
            content: self.content,
            priority,
        })
    }
}

/// Write one node row. Callers that need the write to roll back with later
/// work pass a transaction.
pub(crate) fn persist_node(conn: &Connection, node: &Node) -> MindGraphResult<()> {
    let tags =
        serde_json::to_string(&node.tags).map_err(|e| MindGraphError::Storage(e.to_string()))?;
    conn.execute(
        "INSERT INTO nodes (id, content, tags, priority, created_at, access_count, embedding)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
        rusqlite::params![
            node.id.as_str(),
            node.content,
            tags,
            node.priority.as_str(),
            node.created_at.to_rfc3339(),
            embedding_to_bytes(&node.embedding),
        ],
    )
    .map_err(|e| insert_error(e, &node.id))?;
    Ok(())
}

/// Only a primary-key clash means the id is taken; other constraint
/// failures are storage errors.
fn insert_error(e: rusqlite::Error, id: &NodeId) -> MindGraphError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            MindGraphError::DuplicateId(id.to_string())
        }
        other => MindGraphError::Storage(other.to_string()),
    }
}

pub(crate) fn parse_tags(raw: &str) -> MindGraphResult<BTreeSet<String>> {
    serde_json::from_str(raw).map_err(|e| MindGraphError::Storage(format!("bad tags column: {e}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> MindGraphResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MindGraphError::Storage(format!("bad timestamp '{raw}': {e}")))
}

pub(crate) fn node_exists(conn: &Connection, id: &NodeId) -> MindGraphResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM nodes WHERE id = ?1)",
        rusqlite::params![id.as_str()],
        |row| row.get(0),
    )
    .map_err(|e| MindGraphError::Storage(e.to_string()))
}

pub(crate) fn load_node(conn: &Connection, id: &NodeId) -> MindGraphResult<Option<Node>> {
    let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1");
    let result = conn.query_row(&sql, rusqlite::params![id.as_str()], read_node_row);
    match result {
        Ok(raw) => raw.into_node().map(Some),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(MindGraphError::Storage(e.to_string())),
    }
}

pub(crate) fn load_nodes(conn: &Connection) -> MindGraphResult<Vec<Node>> {
    let sql = format!("SELECT {NODE_COLUMNS} FROM nodes ORDER BY rowid");
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| MindGraphError::Storage(e.to_string()))?;
    let rows = stmt
        .query_map([], read_node_row)
        .map_err(|e| MindGraphError::Storage(e.to_string()))?;
    let mut nodes = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| MindGraphError::Storage(e.to_string()))?;
        nodes.push(raw.into_node()?);
    }
    Ok(nodes)
}

fn load_embedding(conn: &Connection, id: &NodeId) -> MindGraphResult<Option<Vec<f32>>> {
    let result = conn.query_row(
        "SELECT embedding FROM nodes WHERE id = ?1",
        rusqlite::params![id.as_str()],
        |row| row.get::<_, Vec<u8>>(0),
    );
    match result {
        Ok(bytes) => Ok(Some(embedding_from_bytes(&bytes))),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(MindGraphError::Storage(e.to_string())),
    }
}

/// Edges touching `id` on the given side, with the far node's content inlined.
pub(crate) fn load_neighbors(
    conn: &Connection,
    id: &NodeId,
    direction: Direction,
) -> MindGraphResult<Vec<Neighbor>> {
    let sql = match direction {
        Direction::Outgoing => {
            "SELECT e.target_id, e.relationship, e.semantic_strength, n.content, n.tags
             FROM edges e JOIN nodes n ON e.target_id = n.id
             WHERE e.source_id = ?1 ORDER BY e.id"
        }
        Direction::Incoming => {
            "SELECT e.source_id, e.relationship, e.semantic_strength, n.content, n.tags
             FROM edges e JOIN nodes n ON e.source_id = n.id
             WHERE e.target_id = ?1 ORDER BY e.id"
        }
    };
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| MindGraphError::Storage(e.to_string()))?;
    let rows = stmt
        .query_map(rusqlite::params![id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(|e| MindGraphError::Storage(e.to_string()))?;

    let mut neighbors = Vec::new();
    for row in rows {
        let (node_id, relationship, strength, content, tags) =
            row.map_err(|e| MindGraphError::Storage(e.to_string()))?;
        neighbors.push(Neighbor {
            node_id: NodeId(node_id),
            relationship,
            semantic_strength: strength as f32,
            content,
            tags: parse_tags(&tags)?,
        });
    }
    Ok(neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::run_migrations;
    use mindgraph_types::error::ErrorKind;

    fn setup() -> GraphStore {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        GraphStore::new(Arc::new(Mutex::new(conn)))
    }

    fn node(id: &str, embedding: Vec<f32>) -> Node {
        Node {
            id: NodeId::from(id),
            content: format!("content of {id}"),
            tags: ["x".to_string()].into_iter().collect(),
            priority: Priority::High,
            created_at: Utc::now(),
            access_count: 0,
            embedding,
        }
    }

    fn edge(source: &str, target: &str, rel: &str) -> NewEdge {
        NewEdge {
            source_id: NodeId::from(source),
            target_id: NodeId::from(target),
            relationship: rel.to_string(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = setup();
        store.insert_node(&node("a", vec![1.0, 2.0])).unwrap();
        let loaded = store.get_node(&NodeId::from("a")).unwrap();
        assert_eq!(loaded.content, "content of a");
        assert_eq!(loaded.priority, Priority::High);
        assert_eq!(loaded.embedding, vec![1.0, 2.0]);
        assert_eq!(loaded.access_count, 0);
        assert!(loaded.tags.contains("x"));
    }

    #[test]
    fn test_duplicate_insert() {
        let store = setup();
        store.insert_node(&node("a", vec![1.0])).unwrap();
        let err = store.insert_node(&node("a", vec![1.0])).unwrap_err();
        assert!(matches!(err, MindGraphError::DuplicateId(ref id) if id == "a"));
        assert_eq!(store.all_nodes().unwrap().len(), 1);
    }

    #[test]
    fn test_other_constraint_is_not_duplicate() {
        let store = setup();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_blocked BEFORE INSERT ON nodes
                 WHEN NEW.content = 'content of blocked'
                 BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
            )
            .unwrap();
        }
        let err = store.insert_node(&node("blocked", vec![1.0])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!matches!(err, MindGraphError::DuplicateId(_)));
    }

    #[test]
    fn test_get_missing() {
        let store = setup();
        let err = store.get_node(&NodeId::from("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!store.contains(&NodeId::from("nope")).unwrap());
    }

    #[test]
    fn test_connect_is_idempotent() {
        let store = setup();
        store.insert_node(&node("a", vec![1.0, 0.0])).unwrap();
        store.insert_node(&node("b", vec![1.0, 1.0])).unwrap();

        let first = store.connect(&edge("a", "b", "supports")).unwrap();
        let second = store.connect(&edge("a", "b", "supports")).unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.semantic_strength, second.semantic_strength);
        assert!((first.semantic_strength - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert_eq!(store.list_edges().unwrap().len(), 1);
    }

    #[test]
    fn test_connect_distinct_relationships() {
        let store = setup();
        store.insert_node(&node("a", vec![1.0])).unwrap();
        store.insert_node(&node("b", vec![1.0])).unwrap();
        store.connect(&edge("a", "b", "supports")).unwrap();
        store.connect(&edge("a", "b", "questions")).unwrap();
        store.connect(&edge("b", "a", "supports")).unwrap();
        assert_eq!(store.list_edges().unwrap().len(), 3);
    }

    #[test]
    fn test_connect_missing_endpoint() {
        let store = setup();
        store.insert_node(&node("a", vec![1.0])).unwrap();
        let err = store.connect(&edge("a", "ghost", "supports")).unwrap_err();
        assert!(matches!(err, MindGraphError::NotFound(ref id) if id == "ghost"));
        let err = store.connect(&edge("ghost", "a", "supports")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(store.list_edges().unwrap().is_empty());
    }

    #[test]
    fn test_self_loop_allowed() {
        let store = setup();
        store.insert_node(&node("a", vec![0.5, 0.5])).unwrap();
        let outcome = store.connect(&edge("a", "a", "refines")).unwrap();
        assert!((outcome.semantic_strength - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_neighbors() {
        let store = setup();
        store.insert_node(&node("a", vec![1.0])).unwrap();
        store.insert_node(&node("b", vec![1.0])).unwrap();
        store.connect(&edge("a", "b", "builds_on")).unwrap();

        let conn = store.conn.lock().unwrap();
        let out = load_neighbors(&conn, &NodeId::from("a"), Direction::Outgoing).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].node_id.as_str(), "b");
        assert_eq!(out[0].content, "content of b");
        let incoming = load_neighbors(&conn, &NodeId::from("b"), Direction::Incoming).unwrap();
        assert_eq!(incoming[0].node_id.as_str(), "a");
        assert!(load_neighbors(&conn, &NodeId::from("a"), Direction::Incoming)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_corrupt_row_is_storage_error() {
        let store = setup();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO nodes (id, content, tags, priority, created_at, embedding)
                 VALUES ('bad', 'x', 'not json', 'normal', '2024-01-01T00:00:00Z', x'')",
                [],
            )
            .unwrap();
        }
        let err = store.get_node(&NodeId::from("bad")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
