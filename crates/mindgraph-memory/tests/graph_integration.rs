//! End-to-end behaviour of the memory graph through the public `MindGraph` API.

use async_trait::async_trait;
use mindgraph_memory::MindGraph;
use mindgraph_types::config::SuggestionPolicy;
use mindgraph_types::embedding::{EmbeddingError, EmbeddingProvider};
use mindgraph_types::error::MindGraphError;
use mindgraph_types::graph::NodeId;
use mindgraph_types::request::{ConnectRequest, InsertRequest};
use std::sync::Arc;
use std::time::Duration;

/// Deterministic provider: a byte histogram folded into `dims` buckets.
/// Optionally sleeps so concurrent callers overlap inside `embed`.
struct SlowHistogram {
    dims: usize,
    delay: Duration,
}

#[async_trait]
impl EmbeddingProvider for SlowHistogram {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        tokio::time::sleep(self.delay).await;
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0; self.dims];
                for b in t.bytes() {
                    v[b as usize % self.dims] += 1.0;
                }
                v
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

fn provider(delay_ms: u64) -> Arc<SlowHistogram> {
    Arc::new(SlowHistogram {
        dims: 16,
        delay: Duration::from_millis(delay_ms),
    })
}

fn insert(id: &str, content: &str) -> InsertRequest {
    InsertRequest {
        id: Some(id.to_string()),
        content: content.to_string(),
        tags: vec!["test".to_string()],
        priority: Default::default(),
    }
}

fn connect(source: &str, target: &str, rel: &str) -> ConnectRequest {
    ConnectRequest {
        source_id: source.to_string(),
        target_id: target.to_string(),
        relationship: rel.to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_with_same_id_yield_one_success() {
    let graph = MindGraph::open_in_memory(provider(20), SuggestionPolicy::default()).unwrap();

    let a = {
        let graph = graph.clone();
        tokio::spawn(async move { graph.insert(insert("shared", "first writer")).await })
    };
    let b = {
        let graph = graph.clone();
        tokio::spawn(async move { graph.insert(insert("shared", "second writer")).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(MindGraphError::DuplicateId(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 1);
    assert_eq!(graph.list_nodes().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_navigations_are_all_counted() {
    let graph = MindGraph::open_in_memory(provider(0), SuggestionPolicy::default()).unwrap();
    graph.insert(insert("hot", "frequently visited")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let graph = graph.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            for _ in 0..10 {
                graph.navigate(&NodeId::from("hot")).unwrap();
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(graph.get_node(&NodeId::from("hot")).unwrap().access_count, 100);
}

#[tokio::test]
async fn provider_is_deterministic() {
    let p = provider(0);
    let first = p.embed_one("x").await.unwrap();
    let second = p.embed_one("x").await.unwrap();
    let bits = |v: &[f32]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first), bits(&second));
}

#[tokio::test]
async fn degree_and_neighbourhood_agree() {
    let graph = MindGraph::open_in_memory(provider(0), SuggestionPolicy::default()).unwrap();
    for id in ["hub", "o1", "o2", "o3", "i1", "i2"] {
        graph.insert(insert(id, &format!("memory {id}"))).await.unwrap();
    }
    for target in ["o1", "o2", "o3"] {
        graph.connect(connect("hub", target, "builds_on")).unwrap();
    }
    for source in ["i1", "i2"] {
        graph.connect(connect(source, "hub", "supports")).unwrap();
    }
    // Re-connecting an existing key changes nothing
    graph.connect(connect("hub", "o1", "builds_on")).unwrap();

    let stats = graph.stats().unwrap();
    assert_eq!(stats.total_nodes, 6);
    assert_eq!(stats.total_edges, 5);
    let leader = stats.most_connected.unwrap();
    assert_eq!(leader.node_id.as_str(), "hub");
    assert_eq!(leader.count, 5);

    let nav = graph.navigate(&NodeId::from("hub")).unwrap();
    assert_eq!(nav.outgoing_connections.len(), 3);
    assert_eq!(nav.incoming_connections.len(), 2);
    assert_eq!(nav.node.access_count, 1);

    let stats = graph.stats().unwrap();
    assert_eq!(stats.most_accessed.unwrap().node_id.as_str(), "hub");
}

#[tokio::test]
async fn navigate_unknown_node_is_not_found() {
    let graph = MindGraph::open_in_memory(provider(0), SuggestionPolicy::default()).unwrap();
    let err = graph.navigate(&NodeId::from("nowhere")).unwrap_err();
    assert!(matches!(err, MindGraphError::NotFound(_)));
}
