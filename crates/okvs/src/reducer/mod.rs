//! Graph reduction strategies
//!
//! A reducer turns the key hypergraph into an order in which left vertices
//! can be assigned, plus a small residual set of edges that must go through
//! the linear solver:
//!
//! | Strategy | Output | Residual |
//! |----------|--------|----------|
//! | `Singleton` | removal stack (rescans for degree-1 vertices) | 2-core edges |
//! | `TwoCore` | removal stack (degree-1 work queue) | 2-core edges |
//! | `Dfs` | spanning forest in visit order | back edges |
//!
//! All three are sequential: every step depends on the degree or visited
//! state left by the previous one.

mod dfs;
mod peel;

use serde::{Deserialize, Serialize};

use crate::hypergraph::{Edge, Hypergraph};

pub use dfs::{spanning_forest, Component, SpanningForest, TreeEdge};
pub use peel::{peel_singletons, peel_two_core};

/// Which reducer a garbled cuckoo table uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReducerKind {
    Singleton,
    TwoCore,
    Dfs,
}

/// One peeled edge and the vertices it touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub edge: usize,
    pub touched: Edge,
}

/// Output of the peeling reducers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeelingResult {
    /// Peeled edges in removal order; values are assigned from the back
    pub removals: Vec<Removal>,
    /// Edges left in the 2-core, ascending
    pub core_edges: Vec<usize>,
    /// Vertices touched by core edges, ascending
    pub core_vertices: Vec<usize>,
}

/// Output of a reducer
#[derive(Debug, Clone)]
pub enum Reduction {
    Peeled(PeelingResult),
    Forest(SpanningForest),
}

impl Reduction {
    /// Number of edges handed to the linear solver
    pub fn residual_edges(&self) -> usize {
        match self {
            Reduction::Peeled(result) => result.core_edges.len(),
            Reduction::Forest(forest) => forest.back_edges.len(),
        }
    }
}

/// Run the selected reducer
pub fn reduce(kind: ReducerKind, graph: &Hypergraph) -> Reduction {
    match kind {
        ReducerKind::Singleton => Reduction::Peeled(peel_singletons(graph)),
        ReducerKind::TwoCore => Reduction::Peeled(peel_two_core(graph)),
        ReducerKind::Dfs => Reduction::Forest(spanning_forest(graph)),
    }
}
