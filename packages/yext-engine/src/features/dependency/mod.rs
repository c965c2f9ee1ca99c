//! Document dependency graph
//!
//! Tracks which documents import which, rejects edges closing a cycle and
//! computes what is unreachable from the entry documents.

mod dep_graph;

pub use dep_graph::DependencyGraph;
