//! Per-operation request schemas.
//!
//! Requests arrive loosely shaped (from a CLI, a JSON body, an agent tool call)
//! and are validated into the strict forms the store accepts.

use crate::config::{DEFAULT_TOP_K, MAX_TOP_K};
use crate::error::{MindGraphError, MindGraphResult};
use crate::graph::{NodeId, Priority};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Request to store a new memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRequest {
    /// Explicit id. Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
}

/// A validated insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub id: NodeId,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub priority: Priority,
}

impl InsertRequest {
    pub fn validate(self) -> MindGraphResult<NewNode> {
        let id = match self.id {
            Some(id) => NodeId(required("id", &id)?),
            None => NodeId::generate(),
        };
        if self.content.trim().is_empty() {
            return Err(MindGraphError::Validation("content is required".to_string()));
        }
        Ok(NewNode {
            id,
            content: self.content,
            tags: normalize_tags(self.tags)?,
            priority: self.priority,
        })
    }
}

/// Request to search by meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Union filter: a node matches if it carries any of these tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// A validated search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    /// `None` means every node is a candidate.
    pub tags: Option<BTreeSet<String>>,
    pub top_k: usize,
}

impl SearchRequest {
    pub fn validate(self) -> MindGraphResult<SearchQuery> {
        if self.query.trim().is_empty() {
            return Err(MindGraphError::Validation("query is required".to_string()));
        }
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(MindGraphError::Validation(format!(
                "top_k must be between 1 and {MAX_TOP_K}, got {}",
                self.top_k
            )));
        }
        // An empty filter list behaves like no filter.
        let tags = match self.tags {
            Some(tags) if !tags.is_empty() => Some(normalize_tags(tags)?),
            _ => None,
        };
        Ok(SearchQuery {
            query: self.query,
            tags,
            top_k: self.top_k,
        })
    }
}

/// Request to link two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub source_id: String,
    pub target_id: String,
    pub relationship: String,
}

/// A validated connect.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdge {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub relationship: String,
}

impl ConnectRequest {
    pub fn validate(self) -> MindGraphResult<NewEdge> {
        Ok(NewEdge {
            source_id: NodeId(required("source_id", &self.source_id)?),
            target_id: NodeId(required("target_id", &self.target_id)?),
            relationship: required("relationship", &self.relationship)?,
        })
    }
}

fn required(field: &str, value: &str) -> MindGraphResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(MindGraphError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

fn normalize_tags(tags: Vec<String>) -> MindGraphResult<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(MindGraphError::Validation("tags must not be blank".to_string()));
        }
        set.insert(tag.to_string());
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_insert_generates_id_and_dedups_tags() {
        let node = InsertRequest {
            id: None,
            content: "hello".to_string(),
            tags: vec!["x".to_string(), " x ".to_string(), "a".to_string()],
            priority: Priority::High,
        }
        .validate()
        .unwrap();
        assert!(node.id.as_str().starts_with("node-"));
        assert_eq!(node.tags.into_iter().collect::<Vec<_>>(), vec!["a", "x"]);
    }

    #[test]
    fn test_insert_rejects_blank_content() {
        let err = InsertRequest {
            id: Some("n1".to_string()),
            content: "   ".to_string(),
            tags: vec![],
            priority: Priority::Normal,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_insert_from_json_defaults() {
        let req: InsertRequest = serde_json::from_str(r#"{"content": "c"}"#).unwrap();
        assert_eq!(req.priority, Priority::Normal);
        assert!(req.tags.is_empty());
        assert!(req.id.is_none());
    }

    #[test]
    fn test_insert_from_json_priority_any_case() {
        let req: InsertRequest =
            serde_json::from_str(r#"{"content": "c", "priority": "HIGH"}"#).unwrap();
        assert_eq!(req.priority, Priority::High);
        let req: InsertRequest =
            serde_json::from_str(r#"{"content": "c", "priority": "Critical"}"#).unwrap();
        assert_eq!(req.priority, Priority::Critical);
        assert!(serde_json::from_str::<InsertRequest>(r#"{"content": "c", "priority": "urgent"}"#)
            .is_err());
    }

    #[test]
    fn test_search_top_k_bounds() {
        let req = |top_k| SearchRequest {
            query: "q".to_string(),
            tags: None,
            top_k,
        };
        assert!(req(0).validate().is_err());
        assert!(req(MAX_TOP_K + 1).validate().is_err());
        assert_eq!(req(3).validate().unwrap().top_k, 3);
    }

    #[test]
    fn test_search_empty_filter_is_none() {
        let q = SearchRequest {
            query: "q".to_string(),
            tags: Some(vec![]),
            top_k: 5,
        }
        .validate()
        .unwrap();
        assert!(q.tags.is_none());
    }

    #[test]
    fn test_connect_requires_relationship() {
        let err = ConnectRequest {
            source_id: "a".to_string(),
            target_id: "b".to_string(),
            relationship: "".to_string(),
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("relationship"));
    }
}
