//! Shared error types for the MindGraph system.

use thiserror::Error;

/// Coarse error classification exposed to callers of the store.
///
/// Every [`MindGraphError`] maps onto exactly one kind, which is what a
/// transport layer would use to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input, including a duplicate id on insert.
    Validation,
    /// An operation referenced a node that does not exist.
    NotFound,
    /// The embedding provider was unavailable, failed, or changed shape.
    Provider,
    /// The underlying persistence layer failed or holds corrupt data.
    Storage,
}

/// Top-level error type for the MindGraph system.
#[derive(Error, Debug)]
pub enum MindGraphError {
    /// A request field was missing or malformed.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A node with this id already exists.
    #[error("Node already exists: {0}")]
    DuplicateId(String),

    /// The referenced node was not found.
    #[error("Node not found: {0}")]
    NotFound(String),

    /// The embedding provider failed.
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// The provider produced vectors of a different length than the store holds.
    #[error("Embedding dimension mismatch: store expects {expected}, provider produced {actual}")]
    DimensionMismatch {
        /// Dimension pinned by the store.
        expected: usize,
        /// Dimension observed from the provider.
        actual: usize,
    },

    /// The persistence layer failed or returned unreadable data.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl MindGraphError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::DuplicateId(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Provider(_) | Self::DimensionMismatch { .. } => ErrorKind::Provider,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<crate::embedding::EmbeddingError> for MindGraphError {
    fn from(e: crate::embedding::EmbeddingError) -> Self {
        Self::Provider(e.to_string())
    }
}

/// Alias for Result with MindGraphError.
pub type MindGraphResult<T> = Result<T, MindGraphError>;
