//! Core types and traits for MindGraph, a persistent memory graph for agents.
//!
//! This crate defines the shared data model, request schemas, error type and
//! the embedding provider seam. It contains no storage logic.

pub mod config;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod request;
