//! Runtime adapters for MindGraph.
//!
//! Connects the store to the outside world; today that is the HTTP embedding
//! provider.

pub mod embedding;
