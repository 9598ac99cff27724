//! Linear-system glue and value assignment for garbled cuckoo tables
//!
//! A key `k` with left vertices `V(k)`, right bits `r(k)` and value `v(k)`
//! constrains the storage as
//!
//! ```text
//! XOR_{u in V(k)} L[u]  ^  <r(k), R>  =  v(k)
//! ```
//!
//! The reducers shrink the set of constraints that need joint solving; the
//! rest are satisfied one vertex at a time.

use okvs_core::xor::{inner_product, random_row, xor_into};
use okvs_core::{BinaryRow, BinarySystem, SolveOutcome};
use rand::{CryptoRng, RngCore};

use crate::error::{FailureReason, Result};
use crate::hypergraph::{Edge, Hypergraph};
use crate::reducer::{PeelingResult, SpanningForest};

/// Left rows that may still be unassigned, plus the finished right rows
pub(crate) type Assignment = (Vec<Option<Vec<u8>>>, Vec<Vec<u8>>);

/// Hashed entries of one encode call, indexed by edge id. Built fresh per
/// call and dropped with it.
pub(crate) struct EncodeContext<'a> {
    pub graph: Hypergraph,
    pub rights: Vec<Vec<u8>>,
    pub values: Vec<&'a [u8]>,
    pub rm: usize,
    pub byte_l: usize,
}

impl EncodeContext<'_> {
    /// `<r(e), R> ^ v(e)`: what the left vertices of `e` must XOR to
    fn edge_target(&self, e: usize, right: &[Vec<u8>]) -> Vec<u8> {
        let mut target = inner_product(right, &self.rights[e], self.byte_l);
        xor_into(&mut target, self.values[e]);
        target
    }

    /// One row per 2-core edge. Columns are the core vertices (ascending)
    /// followed by the `rm` right rows.
    pub fn core_system(&self, peeled: &PeelingResult) -> Result<BinarySystem> {
        let offset = peeled.core_vertices.len();
        let mut system = BinarySystem::new(offset + self.rm, self.byte_l);

        for &e in &peeled.core_edges {
            let mut row = BinaryRow::new(system.columns(), self.values[e].to_vec());
            for v in self.graph.edge(e).vertices() {
                if let Ok(column) = peeled.core_vertices.binary_search(v) {
                    row.toggle(column);
                }
            }
            row.xor_bits(offset, &self.rights[e], self.rm);
            system.push(row)?;
        }
        Ok(system)
    }

    /// One row per back edge. Columns are the `rm` right rows followed by
    /// one root value per component.
    ///
    /// Every vertex equals its root XOR the tree-edge terms on its path, so
    /// a back edge `(u, w)` reduces to a constraint on the right rows alone
    /// (the roots cancel). A self-loop keeps its root column.
    pub fn forest_system(&self, forest: &SpanningForest) -> Result<BinarySystem> {
        let mut system = BinarySystem::new(self.rm + forest.components.len(), self.byte_l);

        for &e in &forest.back_edges {
            let edge = self.graph.edge(e);
            let mut row = BinaryRow::new(system.columns(), self.values[e].to_vec());
            row.xor_bits(0, &self.rights[e], self.rm);

            for &v in edge.vertices() {
                for t in forest.path_to_root(v) {
                    row.xor_bits(0, &self.rights[t], self.rm);
                    row.xor_target(self.values[t]);
                }
            }
            if edge.is_self_loop() {
                if let Some(c) = forest.component_of[edge.vertices()[0]] {
                    row.toggle(self.rm + c);
                }
            }
            system.push(row)?;
        }
        Ok(system)
    }

    /// Solve the 2-core, then assign peeled edges in reverse removal order
    pub fn assign_peeled<R>(&self, peeled: &PeelingResult, rng: &mut R) -> Result<Assignment>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let mut left: Vec<Option<Vec<u8>>> = vec![None; self.graph.vertex_count()];
        let right = if peeled.core_edges.is_empty() {
            (0..self.rm).map(|_| random_row(rng, self.byte_l)).collect()
        } else {
            let SolveOutcome::Consistent(mut solution) = self.core_system(peeled)?.solve(rng) else {
                return Err(FailureReason::LinearSystemInconsistent.into());
            };
            let right = solution.split_off(peeled.core_vertices.len());
            for (&v, value) in peeled.core_vertices.iter().zip(solution) {
                left[v] = Some(value);
            }
            right
        };

        for removal in peeled.removals.iter().rev() {
            let target = self.edge_target(removal.edge, &right);
            assign_edge(&mut left, &removal.touched, target, rng)?;
        }
        Ok((left, right))
    }

    /// Solve the back edges, then propagate along each component's tree
    pub fn assign_forest<R>(&self, forest: &SpanningForest, rng: &mut R) -> Result<Assignment>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let SolveOutcome::Consistent(mut right) = self.forest_system(forest)?.solve(rng) else {
            return Err(FailureReason::LinearSystemInconsistent.into());
        };
        let roots = right.split_off(self.rm);

        let mut left: Vec<Option<Vec<u8>>> = vec![None; self.graph.vertex_count()];
        for (component, root_value) in forest.components.iter().zip(roots) {
            left[component.root] = Some(root_value);
            for t in &component.tree {
                let mut value = self.edge_target(t.edge, &right);
                if let Some(parent) = &left[t.parent] {
                    xor_into(&mut value, parent);
                }
                left[t.child] = Some(value);
            }
        }
        Ok((left, right))
    }
}

/// Make the vertices of `edge` XOR to `target`. Unassigned vertices are
/// taken in hash order: all but the last get fresh random values, the last
/// is solved for.
pub(crate) fn assign_edge<R>(
    left: &mut [Option<Vec<u8>>],
    edge: &Edge,
    mut target: Vec<u8>,
    rng: &mut R,
) -> Result<()>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut unknown = Vec::with_capacity(edge.vertices().len());
    for &v in edge.vertices() {
        match &left[v] {
            Some(value) => xor_into(&mut target, value),
            None => unknown.push(v),
        }
    }

    let Some((&last, rest)) = unknown.split_last() else {
        if target.iter().any(|&b| b != 0) {
            return Err(FailureReason::LinearSystemInconsistent.into());
        }
        return Ok(());
    };
    for &v in rest {
        let value = random_row(rng, target.len());
        xor_into(&mut target, &value);
        left[v] = Some(value);
    }
    left[last] = Some(target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use okvs_core::xor::xor_rows;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn filled(left: Vec<Option<Vec<u8>>>, byte_l: usize) -> Vec<Vec<u8>> {
        left.into_iter()
            .map(|v| v.unwrap_or_else(|| vec![0u8; byte_l]))
            .collect()
    }

    #[test]
    fn test_assign_edge_three_unknowns() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut left = vec![None; 5];
        let edge = Edge::new(&[4, 0, 2]);
        assign_edge(&mut left, &edge, vec![0xAB, 0xCD], &mut rng).unwrap();

        let rows = filled(left, 2);
        assert_eq!(xor_rows(&rows, edge.vertices(), 2), vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_assign_edge_first_unknown_draws_first() {
        let mut a = ChaCha20Rng::seed_from_u64(2);
        let mut b = ChaCha20Rng::seed_from_u64(2);
        let mut left = vec![None; 3];
        assign_edge(&mut left, &Edge::new(&[2, 1]), vec![0u8; 4], &mut a).unwrap();

        assert_eq!(left[2], Some(random_row(&mut b, 4)));
        assert_eq!(left[1], left[2]);
    }

    #[test]
    fn test_assign_edge_all_known() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut left = vec![Some(vec![1u8]), Some(vec![2u8])];
        let edge = Edge::new(&[0, 1]);

        assert!(assign_edge(&mut left, &edge, vec![3u8], &mut rng).is_ok());
        let err = assign_edge(&mut left, &edge, vec![4u8], &mut rng).unwrap_err();
        assert!(err.is_retriable());
    }

    #[test]
    fn test_self_loop_single_term() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut left = vec![None; 2];
        assign_edge(&mut left, &Edge::new(&[1, 1]), vec![0x5A], &mut rng).unwrap();
        assert_eq!(left[1], Some(vec![0x5A]));
        assert_eq!(left[0], None);
    }
}
