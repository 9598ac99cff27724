//! Garbled cuckoo table
//!
//! Storage is `lm` hash-addressed left rows followed by `rm` dense right
//! rows. A key decodes to the XOR of its 2 or 3 left rows and the right
//! rows selected by its right bit vector.

use std::collections::HashMap;
use std::hash::Hash;

use okvs_core::xor::{inner_product, xor_into, xor_rows};
use okvs_core::STAT_SEC_PARAM;
use rand::{CryptoRng, RngCore};

use crate::error::{OkvsError, Result};
use crate::factory::OkvsType;
use crate::fill::fill_empty;
use crate::hypergraph::{Arity, GctHasher, Hypergraph};
use crate::key::OkvsKey;
use crate::params;
use crate::reducer::{self, ReducerKind, Reduction};
use crate::system::EncodeContext;
use crate::{check_dimensions, sorted_entries, Okvs};

#[derive(Debug, Clone)]
pub struct GctOkvs {
    n: usize,
    l: usize,
    byte_l: usize,
    arity: Arity,
    reducer: ReducerKind,
    lm: usize,
    rm: usize,
    hasher: GctHasher,
    parallel: bool,
}

impl GctOkvs {
    /// `keys` holds one hash key per left hash followed by the right key.
    /// The DFS reducer only supports 2-hash tables.
    pub fn new(
        n: usize,
        l: usize,
        arity: Arity,
        reducer: ReducerKind,
        keys: &[Vec<u8>],
    ) -> Result<Self> {
        check_dimensions(n, l)?;
        if arity == Arity::Three && reducer == ReducerKind::Dfs {
            return Err(OkvsError::PreconditionViolation(
                "DFS reduction requires a 2-hash table".into(),
            ));
        }
        if keys.len() != arity.hash_num() + 1 {
            return Err(OkvsError::PreconditionViolation(format!(
                "expected {} hash keys, got {}",
                arity.hash_num() + 1,
                keys.len()
            )));
        }

        let (lm, rm) = match arity {
            Arity::Two => (params::h2_left_size(n), params::h2_right_size(n)),
            Arity::Three => (params::h3_left_size(n), params::h3_right_size(n)),
        };
        let hasher = GctHasher::new(arity, lm, rm, keys)?;

        tracing::debug!(n, l, lm, rm, ?arity, ?reducer, "Created GCT");

        Ok(Self {
            n,
            l,
            byte_l: l / 8,
            arity,
            reducer,
            lm,
            rm,
            hasher,
            parallel: false,
        })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn lm(&self) -> usize {
        self.lm
    }

    pub fn rm(&self) -> usize {
        self.rm
    }

    pub fn reducer(&self) -> ReducerKind {
        self.reducer
    }
}

impl Okvs for GctOkvs {
    fn okvs_type(&self) -> OkvsType {
        match (self.arity, self.reducer) {
            (Arity::Two, ReducerKind::Singleton) => OkvsType::H2SingletonGct,
            (Arity::Two, ReducerKind::TwoCore) => OkvsType::H2TwoCoreGct,
            (Arity::Two, ReducerKind::Dfs) => OkvsType::H2DfsGct,
            (Arity::Three, ReducerKind::Singleton) => OkvsType::H3SingletonGct,
            // 3-hash DFS is rejected at construction
            (Arity::Three, _) => OkvsType::H3TwoCoreGct,
        }
    }

    fn n(&self) -> usize {
        self.n
    }

    fn l(&self) -> usize {
        self.l
    }

    fn m(&self) -> usize {
        self.lm + self.rm
    }

    fn neg_log_failure_probability(&self) -> usize {
        STAT_SEC_PARAM
    }

    fn encode<K, R>(&self, map: &HashMap<K, Vec<u8>>, rng: &mut R) -> Result<Vec<Vec<u8>>>
    where
        K: OkvsKey + Eq + Hash,
        R: RngCore + CryptoRng + ?Sized,
    {
        let entries = sorted_entries(map, self.n, self.byte_l)?;

        let edges = entries.iter().map(|(k, _)| self.hasher.edge(k)).collect();
        let ctx = EncodeContext {
            graph: Hypergraph::new(self.lm, edges),
            rights: entries.iter().map(|(k, _)| self.hasher.right_bits(k)).collect(),
            values: entries.iter().map(|(_, v)| *v).collect(),
            rm: self.rm,
            byte_l: self.byte_l,
        };

        let reduction = reducer::reduce(self.reducer, &ctx.graph);
        tracing::debug!(
            keys = entries.len(),
            residual = reduction.residual_edges(),
            reducer = ?self.reducer,
            "Reduced hypergraph"
        );

        let assigned = match &reduction {
            Reduction::Peeled(peeled) => ctx.assign_peeled(peeled, rng),
            Reduction::Forest(forest) => ctx.assign_forest(forest, rng),
        };
        let (left, right) = assigned.inspect_err(|e| {
            tracing::warn!(error = %e, residual = reduction.residual_edges(), "GCT encoding failed");
        })?;

        let mut storage = fill_empty(left, self.byte_l, self.parallel, rng);
        storage.extend(right);
        Ok(storage)
    }

    fn decode<K: OkvsKey + ?Sized>(&self, storage: &[Vec<u8>], key: &K) -> Vec<u8> {
        debug_assert_eq!(storage.len(), self.m());
        let key = key.key_bytes();
        let edge = self.hasher.edge(&key);
        let bits = self.hasher.right_bits(&key);

        let mut value = inner_product(&storage[self.lm..], &bits, self.byte_l);
        xor_into(&mut value, &xor_rows(storage, edge.vertices(), self.byte_l));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use okvs_core::prf::random_hash_keys;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const ALL_VARIANTS: [(Arity, ReducerKind); 5] = [
        (Arity::Two, ReducerKind::Singleton),
        (Arity::Two, ReducerKind::TwoCore),
        (Arity::Two, ReducerKind::Dfs),
        (Arity::Three, ReducerKind::Singleton),
        (Arity::Three, ReducerKind::TwoCore),
    ];

    fn random_map(rng: &mut ChaCha20Rng, n: usize, byte_l: usize) -> HashMap<u64, Vec<u8>> {
        (0..n)
            .map(|_| {
                let mut value = vec![0u8; byte_l];
                rng.fill_bytes(&mut value);
                (rng.next_u64(), value)
            })
            .collect()
    }

    fn build(arity: Arity, reducer: ReducerKind, n: usize, rng: &mut ChaCha20Rng) -> GctOkvs {
        let keys = random_hash_keys(rng, arity.hash_num() + 1);
        GctOkvs::new(n, 128, arity, reducer, &keys).unwrap()
    }

    #[test]
    fn test_round_trip_all_variants() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        for (arity, reducer) in ALL_VARIANTS {
            let okvs = build(arity, reducer, 300, &mut rng);
            let map = random_map(&mut rng, 300, 16);
            let storage = okvs.encode(&map, &mut rng).unwrap();

            assert_eq!(storage.len(), okvs.m());
            for (key, value) in &map {
                assert_eq!(&okvs.decode(&storage, key), value, "{:?}", okvs.okvs_type());
            }
        }
    }

    #[test]
    fn test_partial_map() {
        let mut rng = ChaCha20Rng::seed_from_u64(43);
        let okvs = build(Arity::Three, ReducerKind::TwoCore, 100, &mut rng);
        let map = random_map(&mut rng, 10, 16);
        let storage = okvs.encode(&map, &mut rng).unwrap();
        for (key, value) in &map {
            assert_eq!(&okvs.decode(&storage, key), value);
        }
    }

    #[test]
    fn test_single_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(44);
        for (arity, reducer) in ALL_VARIANTS {
            let okvs = build(arity, reducer, 1, &mut rng);
            let map = HashMap::from([("only", vec![0x5Au8; 16])]);
            let storage = okvs.encode(&map, &mut rng).unwrap();
            assert_eq!(okvs.decode(&storage, "only"), vec![0x5Au8; 16]);
        }
    }

    #[test]
    fn test_sizes() {
        let mut rng = ChaCha20Rng::seed_from_u64(45);
        let h2 = build(Arity::Two, ReducerKind::Dfs, 16, &mut rng);
        assert_eq!((h2.lm(), h2.rm()), (40, 48));
        assert_eq!(h2.m(), 88);

        let h3 = build(Arity::Three, ReducerKind::Singleton, 16, &mut rng);
        assert_eq!((h3.lm(), h3.rm()), (24, 48));
    }

    #[test]
    fn test_rejects_h3_dfs() {
        let mut rng = ChaCha20Rng::seed_from_u64(46);
        let keys = random_hash_keys(&mut rng, 4);
        let err = GctOkvs::new(16, 64, Arity::Three, ReducerKind::Dfs, &keys).unwrap_err();
        assert!(matches!(err, OkvsError::PreconditionViolation(_)));
    }

    #[test]
    fn test_rejects_wrong_key_count() {
        let mut rng = ChaCha20Rng::seed_from_u64(47);
        let keys = random_hash_keys(&mut rng, 2);
        assert!(GctOkvs::new(16, 64, Arity::Two, ReducerKind::TwoCore, &keys).is_err());
    }

    #[test]
    fn test_parallel_fill_matches_sequential() {
        let mut rng = ChaCha20Rng::seed_from_u64(48);
        let okvs = build(Arity::Two, ReducerKind::TwoCore, 1000, &mut rng);
        let map = random_map(&mut rng, 1000, 16);

        let a = okvs.encode(&map, &mut ChaCha20Rng::seed_from_u64(1)).unwrap();
        let b = okvs
            .clone()
            .with_parallel(true)
            .encode(&map, &mut ChaCha20Rng::seed_from_u64(1))
            .unwrap();
        assert_eq!(a, b);
    }
}
