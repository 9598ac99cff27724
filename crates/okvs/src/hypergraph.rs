//! Hypergraph construction for garbled cuckoo tables
//!
//! Each encoded key becomes an edge over the left storage rows (vertices
//! `0..lm`) chosen by 2 or 3 keyed hashes, plus a dense right-hand bit
//! vector of `rm` bits. The same hashing is used at decode time, so encode
//! and decode must agree on every detail here.
//!
//! # Degenerate Edges
//!
//! - 2-hash: `h1 == h2` is allowed. The edge keeps a single vertex (a
//!   self-loop) and contributes one XOR term instead of two.
//! - 3-hash: positions are redrawn with a tweak until all three differ,
//!   because a repeated vertex breaks peeling.

use okvs_core::{Prf, Result as CoreResult};

/// Maximum number of left positions per key
pub const MAX_ARITY: usize = 3;

/// Number of left hash functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Two,
    Three,
}

impl Arity {
    pub fn hash_num(self) -> usize {
        match self {
            Arity::Two => 2,
            Arity::Three => 3,
        }
    }
}

/// The distinct left vertices of one key, in hash order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    vertices: [usize; MAX_ARITY],
    len: usize,
}

impl Edge {
    /// Build from hash outputs, dropping repeats (first occurrence wins)
    pub fn new(positions: &[usize]) -> Self {
        debug_assert!(!positions.is_empty() && positions.len() <= MAX_ARITY);
        let mut vertices = [0usize; MAX_ARITY];
        let mut len = 0;
        for &p in positions {
            if !vertices[..len].contains(&p) {
                vertices[len] = p;
                len += 1;
            }
        }
        Self { vertices, len }
    }

    #[inline]
    pub fn vertices(&self) -> &[usize] {
        &self.vertices[..self.len]
    }

    /// A 2-hash edge whose hashes collided
    pub fn is_self_loop(&self) -> bool {
        self.len == 1
    }
}

/// Keyed hash functions shared by GCT encode and decode
#[derive(Debug, Clone)]
pub struct GctHasher {
    arity: Arity,
    left: Vec<Prf>,
    right: Prf,
    lm: usize,
    rm: usize,
}

impl GctHasher {
    /// `keys` holds one key per left hash followed by the right-hand key
    pub fn new(arity: Arity, lm: usize, rm: usize, keys: &[Vec<u8>]) -> CoreResult<Self> {
        debug_assert_eq!(keys.len(), arity.hash_num() + 1);
        let left = keys[..arity.hash_num()]
            .iter()
            .map(|k| Prf::new(k))
            .collect::<CoreResult<Vec<_>>>()?;
        let right = Prf::new(&keys[arity.hash_num()])?;
        Ok(Self {
            arity,
            left,
            right,
            lm,
            rm,
        })
    }

    /// Left vertices of a key
    pub fn edge(&self, key: &[u8]) -> Edge {
        match self.arity {
            Arity::Two => {
                let h1 = self.left[0].integer(key, self.lm);
                let h2 = self.left[1].integer(key, self.lm);
                Edge::new(&[h1, h2])
            }
            Arity::Three => {
                let h1 = self.left[0].integer(key, self.lm);
                let h2 = self.distinct_position(1, key, &[h1]);
                let h3 = self.distinct_position(2, key, &[h1, h2]);
                Edge::new(&[h1, h2, h3])
            }
        }
    }

    /// Right-hand bit vector of a key, `rm / 8` packed bytes
    pub fn right_bits(&self, key: &[u8]) -> Vec<u8> {
        self.right.bytes(key, self.rm / 8)
    }

    fn distinct_position(&self, hash: usize, key: &[u8], taken: &[usize]) -> usize {
        let mut position = self.left[hash].integer(key, self.lm);
        let mut tweak = 0u64;
        while taken.contains(&position) {
            position = self.left[hash].integer_tweaked(key, tweak, self.lm);
            tweak += 1;
        }
        position
    }
}

/// Keys as edges over `vertex_count` left vertices, with vertex incidence
/// stored as flat offsets (CSR) to avoid one allocation per vertex.
#[derive(Debug, Clone)]
pub struct Hypergraph {
    vertex_count: usize,
    edges: Vec<Edge>,
    offsets: Vec<usize>,
    incidence: Vec<usize>,
}

impl Hypergraph {
    pub fn new(vertex_count: usize, edges: Vec<Edge>) -> Self {
        let mut offsets = vec![0usize; vertex_count + 1];
        for edge in &edges {
            for &v in edge.vertices() {
                offsets[v + 1] += 1;
            }
        }
        for v in 0..vertex_count {
            offsets[v + 1] += offsets[v];
        }

        let mut cursor = offsets.clone();
        let mut incidence = vec![0usize; offsets[vertex_count]];
        for (e, edge) in edges.iter().enumerate() {
            for &v in edge.vertices() {
                incidence[cursor[v]] = e;
                cursor[v] += 1;
            }
        }

        Self {
            vertex_count,
            edges,
            offsets,
            incidence,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn edge(&self, e: usize) -> &Edge {
        &self.edges[e]
    }

    /// Edges touching vertex `v`, in ascending edge order
    #[inline]
    pub fn edges_at(&self, v: usize) -> &[usize] {
        &self.incidence[self.offsets[v]..self.offsets[v + 1]]
    }

    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.offsets[v + 1] - self.offsets[v]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(count: usize) -> Vec<Vec<u8>> {
        (0..count).map(|i| vec![i as u8 + 1; 16]).collect()
    }

    #[test]
    fn test_edge_dedup() {
        let edge = Edge::new(&[5, 5]);
        assert_eq!(edge.vertices(), &[5]);
        assert!(edge.is_self_loop());

        let edge = Edge::new(&[3, 1, 3]);
        assert_eq!(edge.vertices(), &[3, 1]);
        assert!(!edge.is_self_loop());
    }

    #[test]
    fn test_h3_positions_distinct() {
        // 8 vertices force frequent collisions between the three hashes
        let hasher = GctHasher::new(Arity::Three, 8, 48, &keys(4)).unwrap();
        for i in 0..2000u32 {
            let edge = hasher.edge(&i.to_le_bytes());
            assert_eq!(edge.vertices().len(), 3);
            assert!(edge.vertices().iter().all(|&v| v < 8));
        }
    }

    #[test]
    fn test_h2_self_loops_occur() {
        let hasher = GctHasher::new(Arity::Two, 8, 48, &keys(3)).unwrap();
        let loops = (0..1000u32)
            .filter(|i| hasher.edge(&i.to_le_bytes()).is_self_loop())
            .count();
        // expected ~1000 / 8
        assert!(loops > 50 && loops < 250, "loops = {}", loops);
    }

    #[test]
    fn test_hashing_deterministic() {
        let hasher = GctHasher::new(Arity::Three, 1024, 48, &keys(4)).unwrap();
        assert_eq!(hasher.edge(b"alice"), hasher.edge(b"alice"));
        assert_eq!(hasher.right_bits(b"alice"), hasher.right_bits(b"alice"));
        assert_eq!(hasher.right_bits(b"alice").len(), 6);
    }

    #[test]
    fn test_incidence() {
        let graph = Hypergraph::new(
            4,
            vec![Edge::new(&[0, 1]), Edge::new(&[1, 2]), Edge::new(&[2, 2])],
        );

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edges_at(0), &[0]);
        assert_eq!(graph.edges_at(1), &[0, 1]);
        assert_eq!(graph.edges_at(2), &[1, 2]);
        assert_eq!(graph.degree(3), 0);
    }
}
