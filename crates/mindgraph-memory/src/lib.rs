//! Memory graph store for autonomous agents.
//!
//! Memories are nodes with an embedding, linked by typed edges, and retrieved
//! by cosine similarity:
//! - **Graph store** (SQLite): write-once nodes and edges
//! - **Access log**: append-only read history plus the navigate counter
//! - **Similarity engine**: brute-force cosine ranking with deterministic ties
//! - **Suggestions / navigation / stats** built on top of the above
//!
//! Callers interact with a single [`MindGraph`] handle.

pub mod access;
pub mod graph;
pub mod migration;
pub mod navigation;
pub mod similarity;
pub mod stats;
pub mod suggest;

mod substrate;
pub use substrate::MindGraph;

#[cfg(test)]
mod testing;
