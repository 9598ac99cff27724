//! Peeling reducers
//!
//! An edge can be peeled when one of its vertices has degree 1: whatever
//! the other vertices hold, that vertex can be solved for last. Edges are
//! assigned in reverse removal order.

use super::{PeelingResult, Removal};
use crate::hypergraph::Hypergraph;

/// Peel by repeated scans: each pass removes every edge that currently has
/// a degree-1 vertex, until a pass removes nothing.
pub fn peel_singletons(graph: &Hypergraph) -> PeelingResult {
    let mut degree: Vec<usize> = (0..graph.vertex_count()).map(|v| graph.degree(v)).collect();
    let mut alive = vec![true; graph.edge_count()];
    let mut removals = Vec::with_capacity(graph.edge_count());

    loop {
        let mut removed_any = false;
        for e in 0..graph.edge_count() {
            if !alive[e] {
                continue;
            }
            let touched = *graph.edge(e);
            if touched.vertices().iter().any(|&v| degree[v] == 1) {
                alive[e] = false;
                for &v in touched.vertices() {
                    degree[v] -= 1;
                }
                removals.push(Removal { edge: e, touched });
                removed_any = true;
            }
        }
        if !removed_any {
            break;
        }
    }

    finish(graph, removals, &alive, &degree)
}

/// Peel with a work queue of degree-1 vertices. Linear time; removes the
/// same edge set as [`peel_singletons`], possibly in a different order.
pub fn peel_two_core(graph: &Hypergraph) -> PeelingResult {
    let mut degree: Vec<usize> = (0..graph.vertex_count()).map(|v| graph.degree(v)).collect();
    let mut alive = vec![true; graph.edge_count()];
    let mut removals = Vec::with_capacity(graph.edge_count());

    let mut queue: Vec<usize> = (0..graph.vertex_count())
        .filter(|&v| degree[v] == 1)
        .rev()
        .collect();

    while let Some(v) = queue.pop() {
        // degree may have dropped to 0 since v was queued
        if degree[v] != 1 {
            continue;
        }
        let Some(&e) = graph.edges_at(v).iter().find(|&&e| alive[e]) else {
            continue;
        };

        let touched = *graph.edge(e);
        alive[e] = false;
        for &u in touched.vertices() {
            degree[u] -= 1;
            if degree[u] == 1 {
                queue.push(u);
            }
        }
        removals.push(Removal { edge: e, touched });
    }

    finish(graph, removals, &alive, &degree)
}

fn finish(
    graph: &Hypergraph,
    removals: Vec<Removal>,
    alive: &[bool],
    degree: &[usize],
) -> PeelingResult {
    let core_edges: Vec<usize> = (0..graph.edge_count()).filter(|&e| alive[e]).collect();
    // every vertex still carrying degree belongs to a surviving edge
    let core_vertices: Vec<usize> = (0..graph.vertex_count())
        .filter(|&v| degree[v] > 0)
        .collect();

    tracing::trace!(
        removed = removals.len(),
        core_edges = core_edges.len(),
        core_vertices = core_vertices.len(),
        "Peeled hypergraph"
    );

    PeelingResult {
        removals,
        core_edges,
        core_vertices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypergraph::Edge;
    use std::collections::BTreeSet;

    /// Path 0-1-2 plus the triangle 3-4-5
    fn path_and_triangle() -> Hypergraph {
        Hypergraph::new(
            6,
            vec![
                Edge::new(&[0, 1]),
                Edge::new(&[1, 2]),
                Edge::new(&[3, 4]),
                Edge::new(&[4, 5]),
                Edge::new(&[5, 3]),
            ],
        )
    }

    fn removed_set(result: &PeelingResult) -> BTreeSet<usize> {
        result.removals.iter().map(|r| r.edge).collect()
    }

    #[test]
    fn test_singletons_leave_cycle() {
        let result = peel_singletons(&path_and_triangle());
        assert_eq!(removed_set(&result), BTreeSet::from([0, 1]));
        assert_eq!(result.core_edges, vec![2, 3, 4]);
        assert_eq!(result.core_vertices, vec![3, 4, 5]);
    }

    #[test]
    fn test_two_core_matches_singletons() {
        let graph = path_and_triangle();
        let a = peel_singletons(&graph);
        let b = peel_two_core(&graph);
        assert_eq!(removed_set(&a), removed_set(&b));
        assert_eq!(a.core_edges, b.core_edges);
        assert_eq!(a.core_vertices, b.core_vertices);
    }

    #[test]
    fn test_removal_order_is_valid() {
        // Replaying removals in order, each edge must have a vertex that no
        // later-removed or core edge touches.
        let graph = Hypergraph::new(
            7,
            vec![
                Edge::new(&[0, 1, 2]),
                Edge::new(&[2, 3, 4]),
                Edge::new(&[4, 5, 6]),
                Edge::new(&[1, 3, 5]),
            ],
        );
        for result in [peel_singletons(&graph), peel_two_core(&graph)] {
            assert!(result.core_edges.is_empty());
            for (i, removal) in result.removals.iter().enumerate() {
                let later: Vec<_> = result.removals[i + 1..].iter().map(|r| r.touched).collect();
                let has_free = removal
                    .touched
                    .vertices()
                    .iter()
                    .any(|v| later.iter().all(|e| !e.vertices().contains(v)));
                assert!(has_free, "removal {} has no free vertex", i);
            }
        }
    }

    #[test]
    fn test_self_loop_peels() {
        let graph = Hypergraph::new(3, vec![Edge::new(&[1, 1]), Edge::new(&[1, 2])]);
        let result = peel_two_core(&graph);
        assert_eq!(result.removals.len(), 2);
        assert!(result.core_edges.is_empty());
        assert!(result.core_vertices.is_empty());
    }

    #[test]
    fn test_double_edge_is_core() {
        let graph = Hypergraph::new(2, vec![Edge::new(&[0, 1]), Edge::new(&[1, 0])]);
        let result = peel_singletons(&graph);
        assert!(result.removals.is_empty());
        assert_eq!(result.core_edges, vec![0, 1]);
    }
}
