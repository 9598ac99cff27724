//! Depth-first spanning forest for 2-hash graphs
//!
//! Each tree edge has exactly one vertex that was unvisited when the edge
//! was walked, so once a component's root value is fixed every other vertex
//! follows by XOR along the tree. Back edges (including self-loops) are the
//! only constraints left for the linear solver.

use crate::hypergraph::Hypergraph;

/// Tree edge walked from `parent` to the newly visited `child`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEdge {
    pub edge: usize,
    pub parent: usize,
    pub child: usize,
}

/// One connected component, tree edges in visit order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub root: usize,
    pub tree: Vec<TreeEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanningForest {
    pub components: Vec<Component>,
    /// Edges closing a cycle, in discovery order
    pub back_edges: Vec<usize>,
    /// Per vertex: the tree edge it was reached by and the vertex it came from
    pub parent: Vec<Option<(usize, usize)>>,
    /// Per vertex: its component, `None` for vertices no edge touches
    pub component_of: Vec<Option<usize>>,
}

impl SpanningForest {
    /// Tree edges from `v` up to its component root
    pub fn path_to_root(&self, mut v: usize) -> Vec<usize> {
        let mut path = Vec::new();
        while let Some((edge, up)) = self.parent[v] {
            path.push(edge);
            v = up;
        }
        path
    }
}

/// Build the forest with an explicit stack, rooting components at their
/// lowest vertex.
pub fn spanning_forest(graph: &Hypergraph) -> SpanningForest {
    let vertex_count = graph.vertex_count();
    let mut parent = vec![None; vertex_count];
    let mut component_of: Vec<Option<usize>> = vec![None; vertex_count];
    let mut walked = vec![false; graph.edge_count()];
    let mut components = Vec::new();
    let mut back_edges = Vec::new();

    // (vertex, next position in its incidence list)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..vertex_count {
        if component_of[root].is_some() || graph.degree(root) == 0 {
            continue;
        }
        let c = components.len();
        component_of[root] = Some(c);
        let mut tree = Vec::new();
        stack.push((root, 0));

        while let Some(top) = stack.last_mut() {
            let (v, cursor) = *top;
            let incident = graph.edges_at(v);
            if cursor == incident.len() {
                stack.pop();
                continue;
            }
            top.1 += 1;

            let e = incident[cursor];
            if walked[e] {
                continue;
            }
            walked[e] = true;

            let edge = graph.edge(e);
            debug_assert!(edge.vertices().len() <= 2, "DFS needs 2-hash edges");
            match edge.vertices().iter().copied().find(|&w| w != v) {
                Some(w) if component_of[w].is_none() => {
                    component_of[w] = Some(c);
                    parent[w] = Some((e, v));
                    tree.push(TreeEdge {
                        edge: e,
                        parent: v,
                        child: w,
                    });
                    stack.push((w, 0));
                }
                _ => back_edges.push(e),
            }
        }

        components.push(Component { root, tree });
    }

    tracing::trace!(
        components = components.len(),
        back_edges = back_edges.len(),
        "Built spanning forest"
    );

    SpanningForest {
        components,
        back_edges,
        parent,
        component_of,
    }
}
