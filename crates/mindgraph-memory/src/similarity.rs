//! Cosine similarity, deterministic ranking, and the embedding BLOB codec.
//!
//! Ranking is a brute-force linear scan. Ties on similarity are broken by
//! ascending creation time and then ascending id, so the same store always
//! yields the same order.

use chrono::{DateTime, Utc};
use mindgraph_types::graph::{Node, NodeId};
use std::cmp::Ordering;

/// Anything the similarity engine can score against a query vector.
pub trait Candidate {
    fn id(&self) -> &NodeId;
    fn created_at(&self) -> DateTime<Utc>;
    fn embedding(&self) -> &[f32];
}

impl Candidate for Node {
    fn id(&self) -> &NodeId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn embedding(&self) -> &[f32] {
        &self.embedding
    }
}

/// A candidate paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub item: T,
    pub similarity: f32,
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1.0, 1.0] where 1.0 = identical direction. Returns 0.0
/// when either vector has zero norm, when lengths differ, or when empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    // sqrt of the product keeps exact ratios exact, e.g. 1 / sqrt(2 * 2) == 0.5
    let denom = (norm_a * norm_b).sqrt();
    (dot / denom).clamp(-1.0, 1.0) as f32
}

fn by_rank<T: Candidate>(a: &Ranked<T>, b: &Ranked<T>) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.item.created_at().cmp(&b.item.created_at()))
        .then_with(|| a.item.id().cmp(b.item.id()))
}

/// Score every candidate against `query` and return the best `top_k`.
pub fn rank<T, I>(query: &[f32], candidates: I, top_k: usize) -> Vec<Ranked<T>>
where
    T: Candidate,
    I: IntoIterator<Item = T>,
{
    let mut scored: Vec<Ranked<T>> = candidates
        .into_iter()
        .map(|item| {
            let similarity = cosine_similarity(query, item.embedding());
            Ranked { item, similarity }
        })
        .collect();
    scored.sort_by(by_rank);
    scored.truncate(top_k);
    scored
}

/// Like [`rank`], keeping only candidates with similarity `>= threshold`.
pub fn rank_above<T, I>(query: &[f32], candidates: I, threshold: f32, limit: usize) -> Vec<Ranked<T>>
where
    T: Candidate,
    I: IntoIterator<Item = T>,
{
    let mut scored: Vec<Ranked<T>> = candidates
        .into_iter()
        .filter_map(|item| {
            let similarity = cosine_similarity(query, item.embedding());
            (similarity >= threshold).then_some(Ranked { item, similarity })
        })
        .collect();
    scored.sort_by(by_rank);
    scored.truncate(limit);
    scored
}

/// Serialize embedding to bytes for SQLite BLOB storage.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        bytes.extend_from_slice(&val.to_le_bytes());
    }
    bytes
}

/// Deserialize embedding from bytes.
pub fn embedding_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mindgraph_types::graph::Priority;
    use std::collections::BTreeSet;

    fn node(id: &str, secs: i64, embedding: Vec<f32>) -> Node {
        Node {
            id: NodeId::from(id),
            content: id.to_string(),
            tags: BTreeSet::new(),
            priority: Priority::Normal,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            access_count: 0,
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let v = vec![0.3, -1.7, 2.5, 0.01];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_empty_and_mismatch() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_exact_half() {
        let sim = cosine_similarity(&[1.0, 1.0, 0.0], &[0.0, 1.0, 1.0]);
        assert_eq!(sim, 0.5);
    }

    #[test]
    fn test_rank_orders_descending() {
        let query = vec![1.0, 0.0];
        let ranked = rank(
            &query,
            vec![
                node("low", 0, vec![0.3, 0.953_939_2]),
                node("high", 1, vec![0.9, 0.435_889_9]),
            ],
            10,
        );
        assert_eq!(ranked[0].item.id.as_str(), "high");
        assert!((ranked[0].similarity - 0.9).abs() < 1e-4);
        assert!((ranked[1].similarity - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_rank_ties_by_created_then_id() {
        let query = vec![1.0, 0.0];
        let ranked = rank(
            &query,
            vec![
                node("b", 5, vec![2.0, 0.0]),
                node("c", 1, vec![1.0, 0.0]),
                node("a", 5, vec![3.0, 0.0]),
            ],
            10,
        );
        let ids: Vec<&str> = ranked.iter().map(|r| r.item.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_rank_truncates() {
        let query = vec![1.0];
        let nodes = (0..10).map(|i| node(&format!("n{i}"), i, vec![1.0]));
        assert_eq!(rank(&query, nodes, 3).len(), 3);
    }

    #[test]
    fn test_rank_above_threshold() {
        let query = vec![1.0, 1.0, 0.0];
        let ranked = rank_above(
            &query,
            vec![
                node("half", 0, vec![0.0, 1.0, 1.0]),
                node("same", 1, vec![1.0, 1.0, 0.0]),
                node("none", 2, vec![0.0, 0.0, 1.0]),
            ],
            0.5,
            5,
        );
        let ids: Vec<&str> = ranked.iter().map(|r| r.item.id.as_str()).collect();
        assert_eq!(ids, vec!["same", "half"]);
    }

    #[test]
    fn test_embedding_roundtrip() {
        let embedding = vec![0.1, -0.5, 1.23456, 0.0, -1e10, 1e10];
        let recovered = embedding_from_bytes(&embedding_to_bytes(&embedding));
        assert_eq!(embedding, recovered);
    }

    #[test]
    fn test_embedding_bytes_empty() {
        assert!(embedding_to_bytes(&[]).is_empty());
        assert!(embedding_from_bytes(&[]).is_empty());
    }
}
