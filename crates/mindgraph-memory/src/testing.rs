//! Deterministic embedding providers for tests.

use async_trait::async_trait;
use mindgraph_types::embedding::{EmbeddingError, EmbeddingProvider};
use std::collections::HashMap;

/// Returns fixed vectors for known texts and a byte-histogram vector otherwise.
pub struct StubEmbedder {
    dims: usize,
    fixed: HashMap<String, Vec<f32>>,
}

impl StubEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            fixed: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), self.dims, "stub vector has wrong length");
        self.fixed.insert(text.to_string(), vector);
        self
    }

    fn histogram(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dims];
        for b in text.bytes() {
            v[b as usize % self.dims] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                self.fixed
                    .get(*t)
                    .cloned()
                    .unwrap_or_else(|| self.histogram(t))
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Always fails, as an unreachable provider would.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Http("connection refused".to_string()))
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Declares one dimension but returns another.
pub struct DriftingEmbedder;

#[async_trait]
impl EmbeddingProvider for DriftingEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| vec![1.0; 8]).collect())
    }

    fn dimensions(&self) -> usize {
        4
    }
}
