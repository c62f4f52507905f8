//! Memory graph types: nodes, edges, access-log entries, and operation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum characters of content shown in a suggestion preview.
pub const PREVIEW_CHARS: usize = 100;

/// Opaque unique identifier for a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Generate a fresh id of the form `node-<12 hex chars>`.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("node-{}", &hex[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How important a memory is to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Core realizations.
    Critical,
    High,
    /// Ordinary observations.
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            other => Err(format!(
                "unknown priority '{other}' (expected critical, high, normal or low)"
            )),
        }
    }
}

/// Accepts any casing, like [`FromStr`].
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Why a node was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Returned as a search hit. Logged but never counted.
    Search,
    /// Opened via navigate. Increments `access_count`.
    Navigate,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Navigate => "navigate",
        }
    }
}

impl std::fmt::Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(Self::Search),
            "navigate" => Ok(Self::Navigate),
            other => Err(format!("unknown access type '{other}'")),
        }
    }
}

/// A stored memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// The textual content of this memory.
    pub content: String,
    /// Semantic tags, sorted and de-duplicated.
    pub tags: BTreeSet<String>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    /// Number of completed navigations of this node.
    pub access_count: u64,
    /// Vector embedding of `content`.
    pub embedding: Vec<f32>,
}

impl Node {
    /// Drop the embedding for display or export.
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            priority: self.priority,
            created_at: self.created_at,
            access_count: self.access_count,
        }
    }
}

/// A node without its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub access_count: u64,
}

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: NodeId,
    pub target_id: NodeId,
    /// Relationship label (builds_on, supports, contrasts_with, ...).
    pub relationship: String,
    /// Cosine similarity of the endpoint embeddings at creation time.
    pub semantic_strength: f32,
    pub created_at: DateTime<Utc>,
}

/// One row of the append-only access log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub node_id: NodeId,
    pub accessed_at: DateTime<Utc>,
    pub access_type: AccessType,
}

/// An existing node proposed as a link target for a newly inserted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub node_id: NodeId,
    /// Up to [`PREVIEW_CHARS`] characters of content, suffixed with `...` when cut.
    pub content: String,
    pub tags: BTreeSet<String>,
    pub similarity: f32,
}

/// Result of an insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertOutcome {
    pub node_id: NodeId,
    /// Advisory only. Nothing is linked until the caller connects explicitly.
    pub suggested_connections: Vec<Suggestion>,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub node_id: NodeId,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub priority: Priority,
    pub similarity: f32,
    pub access_count: u64,
}

/// Result of a connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectOutcome {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub relationship: String,
    pub semantic_strength: f32,
    /// `false` when the edge already existed and nothing was written.
    pub created: bool,
}

/// An edge seen from one endpoint, with the other endpoint's content inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// The node at the far end of the edge.
    pub node_id: NodeId,
    pub relationship: String,
    pub semantic_strength: f32,
    pub content: String,
    pub tags: BTreeSet<String>,
}

/// Result of a navigate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Navigation {
    /// The node, with `access_count` already including this navigation.
    pub node: NodeSummary,
    pub outgoing_connections: Vec<Neighbor>,
    pub incoming_connections: Vec<Neighbor>,
}

/// A node singled out by a stats aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRanking {
    pub node_id: NodeId,
    pub content: String,
    /// Degree for `most_connected`, access count for `most_accessed`.
    pub count: u64,
}

/// Aggregate statistics over the whole store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: u64,
    pub total_edges: u64,
    pub total_accesses: u64,
    pub most_connected: Option<NodeRanking>,
    pub most_accessed: Option<NodeRanking>,
}

/// Whole-graph bulk export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeSummary>,
    pub edges: Vec<Edge>,
}

/// Format for graph export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// JSON format.
    Json,
    /// MessagePack binary format.
    MessagePack,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "msgpack" | "messagepack" => Ok(Self::MessagePack),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// Shorten content for previews, respecting char boundaries.
pub fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}
