//! Insert-time link suggestions.
//!
//! Suggestions are advisory: nothing here writes an edge or an access-log row.

use crate::graph::load_nodes;
use crate::similarity::rank_above;
use mindgraph_types::config::SuggestionPolicy;
use mindgraph_types::error::{MindGraphError, MindGraphResult};
use mindgraph_types::graph::{preview, Node, Suggestion};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Proposes existing nodes that a new node should probably be linked to.
#[derive(Clone)]
pub struct SuggestionEngine {
    conn: Arc<Mutex<Connection>>,
    policy: SuggestionPolicy,
}

impl SuggestionEngine {
    pub fn new(conn: Arc<Mutex<Connection>>, policy: SuggestionPolicy) -> Self {
        Self { conn, policy }
    }

    /// Compare `node` against every other stored node.
    pub fn suggest(&self, node: &Node) -> MindGraphResult<Vec<Suggestion>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MindGraphError::Storage(e.to_string()))?;
        self.suggest_in(&conn, node)
    }

    /// Same as [`Self::suggest`] on a connection the caller already holds,
    /// typically the transaction that just wrote `node`.
    pub(crate) fn suggest_in(
        &self,
        conn: &Connection,
        node: &Node,
    ) -> MindGraphResult<Vec<Suggestion>> {
        let stored = load_nodes(conn)?;
        let others: Vec<Node> = stored
            .into_iter()
            .filter(|other| other.id != node.id)
            .collect();
        let scanned = others.len();

        let suggestions: Vec<Suggestion> = rank_above(
            &node.embedding,
            others,
            self.policy.threshold,
            self.policy.limit,
        )
        .into_iter()
        .map(|ranked| Suggestion {
            content: preview(&ranked.item.content),
            node_id: ranked.item.id,
            tags: ranked.item.tags,
            similarity: ranked.similarity,
        })
        .collect();

        debug!(
            node = %node.id,
            scanned,
            suggested = suggestions.len(),
            "Computed link suggestions"
        );
        Ok(suggestions)
    }
}
