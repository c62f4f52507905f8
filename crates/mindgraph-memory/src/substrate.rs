//! The unified store handle.
//!
//! `MindGraph` owns one SQLite connection and the embedding provider, and
//! composes the graph store, access log, suggestion engine, navigator and
//! stats engine over that shared connection.

use crate::access::{append, AccessLog};
use crate::graph::{load_nodes, persist_node, GraphStore};
use crate::migration::run_migrations;
use crate::navigation::Navigator;
use crate::similarity::rank;
use crate::stats::StatsEngine;
use crate::suggest::SuggestionEngine;
use chrono::Utc;
use mindgraph_types::config::SuggestionPolicy;
use mindgraph_types::embedding::EmbeddingProvider;
use mindgraph_types::error::{MindGraphError, MindGraphResult};
use mindgraph_types::graph::{
    AccessLogEntry, AccessType, ConnectOutcome, Edge, ExportFormat, GraphExport, GraphStats,
    InsertOutcome, Navigation, Node, NodeId, NodeSummary, SearchHit,
};
use mindgraph_types::request::{
    ConnectRequest, InsertRequest, NewEdge, NewNode, SearchQuery, SearchRequest,
};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

const DIMENSIONS_KEY: &str = "embedding_dimensions";

/// A persistent memory graph.
///
/// Cheap to clone; clones share the same connection and provider.
#[derive(Clone)]
pub struct MindGraph {
    conn: Arc<Mutex<Connection>>,
    provider: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
    graph: GraphStore,
    access: AccessLog,
    suggestions: SuggestionEngine,
    navigator: Navigator,
    stats: StatsEngine,
}

impl MindGraph {
    /// Open (or create) a store at `db_path`.
    pub fn open(
        db_path: &Path,
        provider: Arc<dyn EmbeddingProvider>,
        policy: SuggestionPolicy,
    ) -> MindGraphResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MindGraphError::Storage(e.to_string()))?;
            }
        }
        let conn =
            Connection::open(db_path).map_err(|e| MindGraphError::Storage(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        let store = Self::with_connection(conn, provider, policy)?;
        info!(
            path = %db_path.display(),
            dimensions = store.dimensions,
            "Opened memory graph"
        );
        Ok(store)
    }

    /// Create an isolated in-memory store.
    pub fn open_in_memory(
        provider: Arc<dyn EmbeddingProvider>,
        policy: SuggestionPolicy,
    ) -> MindGraphResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| MindGraphError::Storage(e.to_string()))?;
        Self::with_connection(conn, provider, policy)
    }

    fn with_connection(
        conn: Connection,
        provider: Arc<dyn EmbeddingProvider>,
        policy: SuggestionPolicy,
    ) -> MindGraphResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        run_migrations(&conn).map_err(|e| MindGraphError::Storage(e.to_string()))?;
        let dimensions = pin_dimensions(&conn, provider.dimensions())?;

        let conn = Arc::new(Mutex::new(conn));
        Ok(Self {
            graph: GraphStore::new(Arc::clone(&conn)),
            access: AccessLog::new(Arc::clone(&conn)),
            suggestions: SuggestionEngine::new(Arc::clone(&conn), policy),
            navigator: Navigator::new(Arc::clone(&conn)),
            stats: StatsEngine::new(Arc::clone(&conn)),
            conn,
            provider,
            dimensions,
        })
    }

    /// The embedding dimension pinned for this store.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Validate and insert a new memory.
    pub async fn insert(&self, request: InsertRequest) -> MindGraphResult<InsertOutcome> {
        self.insert_node(request.validate()?).await
    }

    /// Insert a validated node, returning advisory link suggestions.
    pub async fn insert_node(&self, new: NewNode) -> MindGraphResult<InsertOutcome> {
        // Early exit before paying for an embedding; the primary key still
        // arbitrates concurrent inserts below.
        if self.graph.contains(&new.id)? {
            return Err(MindGraphError::DuplicateId(new.id.to_string()));
        }
        let embedding = self.embed(&new.content).await?;
        let node = Node {
            id: new.id,
            content: new.content,
            tags: new.tags,
            priority: new.priority,
            created_at: Utc::now(),
            access_count: 0,
            embedding,
        };
        // Persist and scan in one transaction so a failed scan leaves no row behind.
        let suggested_connections = {
            let mut conn = self
                .conn
                .lock()
                .map_err(|e| MindGraphError::Storage(e.to_string()))?;
            let tx = conn
                .transaction()
                .map_err(|e| MindGraphError::Storage(e.to_string()))?;
            persist_node(&tx, &node)?;
            let suggestions = self.suggestions.suggest_in(&tx, &node)?;
            tx.commit()
                .map_err(|e| MindGraphError::Storage(e.to_string()))?;
            suggestions
        };
        info!(
            node = %node.id,
            priority = %node.priority,
            suggestions = suggested_connections.len(),
            "Inserted memory"
        );
        Ok(InsertOutcome {
            node_id: node.id,
            suggested_connections,
        })
    }

    /// Fetch a node by id.
    pub fn get_node(&self, id: &NodeId) -> MindGraphResult<Node> {
        self.graph.get_node(id)
    }

    /// Validate and run a similarity search.
    pub async fn search(&self, request: SearchRequest) -> MindGraphResult<Vec<SearchHit>> {
        self.search_query(request.validate()?).await
    }

    /// Rank candidates against the embedded query and log each returned hit.
    pub async fn search_query(&self, query: SearchQuery) -> MindGraphResult<Vec<SearchHit>> {
        let query_embedding = self.embed(&query.query).await?;

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        let candidates: Vec<Node> = load_nodes(&conn)?
            .into_iter()
            .filter(|node| match &query.tags {
                Some(filter) => !node.tags.is_disjoint(filter),
                None => true,
            })
            .collect();
        let scanned = candidates.len();
        let ranked = rank(&query_embedding, candidates, query.top_k);

        let tx = conn
            .transaction()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        for hit in &ranked {
            append(&tx, &hit.item.id, AccessType::Search)?;
        }
        tx.commit()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;

        debug!(scanned, returned = ranked.len(), "Vector search");
        Ok(ranked
            .into_iter()
            .map(|r| SearchHit {
                node_id: r.item.id,
                content: r.item.content,
                tags: r.item.tags,
                priority: r.item.priority,
                similarity: r.similarity,
                access_count: r.item.access_count,
            })
            .collect())
    }

    /// Validate and create an edge.
    pub fn connect(&self, request: ConnectRequest) -> MindGraphResult<ConnectOutcome> {
        self.connect_nodes(&request.validate()?)
    }

    /// Create an edge, or return the existing one's strength if the key exists.
    pub fn connect_nodes(&self, edge: &NewEdge) -> MindGraphResult<ConnectOutcome> {
        self.graph.connect(edge)
    }

    /// Expand a node's neighbourhood and count the visit.
    pub fn navigate(&self, id: &NodeId) -> MindGraphResult<Navigation> {
        self.navigator.navigate(id)
    }

    /// Append an access-log row; navigate accesses also bump `access_count`.
    pub fn record_access(&self, id: &NodeId, access_type: AccessType) -> MindGraphResult<()> {
        self.access.record(id, access_type)
    }

    /// Most recent accesses of a node, newest first.
    pub fn access_history(
        &self,
        id: &NodeId,
        limit: usize,
    ) -> MindGraphResult<Vec<AccessLogEntry>> {
        self.access.history(id, limit)
    }

    pub fn stats(&self) -> MindGraphResult<GraphStats> {
        self.stats.stats()
    }

    pub fn list_nodes(&self) -> MindGraphResult<Vec<NodeSummary>> {
        self.graph.list_nodes()
    }

    pub fn list_edges(&self) -> MindGraphResult<Vec<Edge>> {
        self.graph.list_edges()
    }

    /// Export every node and edge.
    pub fn export(&self, format: ExportFormat) -> MindGraphResult<Vec<u8>> {
        let data = GraphExport {
            nodes: self.list_nodes()?,
            edges: self.list_edges()?,
        };
        match format {
            ExportFormat::Json => serde_json::to_vec_pretty(&data)
                .map_err(|e| MindGraphError::Storage(e.to_string())),
            ExportFormat::MessagePack => rmp_serde::to_vec_named(&data)
                .map_err(|e| MindGraphError::Storage(e.to_string())),
        }
    }

    /// Embed `text`, refusing vectors whose length differs from the pinned dimension.
    async fn embed(&self, text: &str) -> MindGraphResult<Vec<f32>> {
        let vector = self.provider.embed_one(text).await?;
        if vector.len() != self.dimensions {
            warn!(
                expected = self.dimensions,
                actual = vector.len(),
                "Embedding provider changed output dimension"
            );
            return Err(MindGraphError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        if !vector.iter().all(|x| x.is_finite()) {
            warn!("Embedding provider returned a non-finite component");
            return Err(MindGraphError::Provider(
                "embedding contains NaN or infinite values".to_string(),
            ));
        }
        Ok(vector)
    }
}

/// Record the provider's dimension on first open; afterwards insist it matches.
fn pin_dimensions(conn: &Connection, provider_dims: usize) -> MindGraphResult<usize> {
    if provider_dims == 0 {
        return Err(MindGraphError::Provider(
            "provider reports zero-dimensional embeddings".to_string(),
        ));
    }
    let stored = conn.query_row(
        "SELECT value FROM store_meta WHERE key = ?1",
        rusqlite::params![DIMENSIONS_KEY],
        |row| row.get::<_, String>(0),
    );
    match stored {
        Ok(value) => {
            let pinned: usize = value
                .parse()
                .map_err(|e| MindGraphError::Storage(format!("bad {DIMENSIONS_KEY}: {e}")))?;
            if pinned != provider_dims {
                return Err(MindGraphError::DimensionMismatch {
                    expected: pinned,
                    actual: provider_dims,
                });
            }
            Ok(pinned)
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            conn.execute(
                "INSERT INTO store_meta (key, value) VALUES (?1, ?2)",
                rusqlite::params![DIMENSIONS_KEY, provider_dims.to_string()],
            )
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
            Ok(provider_dims)
        }
        Err(e) => Err(MindGraphError::Storage(e.to_string())),
    }
}
